use bigdecimal::ToPrimitive;
use diesel::{dsl::sum, prelude::*};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::{schema::allocations, DbConnection};

/// One claimed slice of a tile. A provider's current usage for a class is
/// the sum of `used` over all live rows for that `(provider, class)`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = allocations)]
pub struct Allocation {
    pub id: i64,
    pub resource_provider_id: i64,
    pub consumer_id: Uuid,
    pub resource_class_id: i32,
    pub used: i64,
}

impl Allocation {
    pub async fn create<'a>(
        conn: &mut DbConnection<'a>,
        resource_provider_id: i64,
        consumer_id: Uuid,
        resource_class_id: i32,
        used: i64,
    ) -> Result<Self, diesel::result::Error> {
        let allocation = diesel::insert_into(allocations::table)
            .values((
                allocations::resource_provider_id.eq(resource_provider_id),
                allocations::consumer_id.eq(consumer_id),
                allocations::resource_class_id.eq(resource_class_id),
                allocations::used.eq(used),
            ))
            .returning(Allocation::as_select())
            .get_result(conn)
            .await?;
        Ok(allocation)
    }

    /// Summed usage per `(provider, class)` over the given providers and
    /// classes. Pairs with no live allocations are absent from the result.
    pub async fn sum_usages<'a>(
        conn: &mut DbConnection<'a>,
        provider_ids: Vec<i64>,
        class_ids: Vec<i32>,
    ) -> Result<Vec<(i64, i32, i64)>, diesel::result::Error> {
        let rows: Vec<(i64, i32, Option<bigdecimal::BigDecimal>)> = allocations::table
            .filter(allocations::resource_provider_id.eq_any(provider_ids))
            .filter(allocations::resource_class_id.eq_any(class_ids))
            .group_by((
                allocations::resource_provider_id,
                allocations::resource_class_id,
            ))
            .select((
                allocations::resource_provider_id,
                allocations::resource_class_id,
                sum(allocations::used),
            ))
            .load(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(rp, rc, total)| {
                let total = total.and_then(|t| t.to_i64()).unwrap_or(0);
                (rp, rc, total)
            })
            .collect())
    }
}
