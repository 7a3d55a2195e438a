use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{models::provider::ResourceProvider, schema::inventories, DbConnection};

/// One inventory tile: the capacity a single provider exposes for a single
/// resource class. At most one row exists per `(provider, class)` pair.
#[derive(Debug, Clone, Queryable, Insertable, Selectable, Associations)]
#[diesel(table_name = inventories)]
#[diesel(belongs_to(ResourceProvider, foreign_key = resource_provider_id))]
pub struct Inventory {
    pub id: i64,
    pub resource_provider_id: i64,
    pub resource_class_id: i32,
    pub total: i64,
    /// Slice of `total` withheld from placement, e.g. host overhead.
    pub reserved: i64,
    pub min_unit: i64,
    pub max_unit: i64,
    pub step_size: i64,
    pub allocation_ratio: f64,
}

impl Inventory {
    /// Effective capacity of this tile:
    /// `floor((total - reserved) * allocation_ratio)`, truncated toward
    /// zero after the ratio multiplication.
    pub fn capacity(&self) -> i64 {
        (((self.total - self.reserved) as f64) * self.allocation_ratio) as i64
    }

    /// Capacity left over after `used` has been claimed by allocations.
    pub fn remaining(&self, used: i64) -> i64 {
        self.capacity() - used
    }

    /// Whether a request for `amount` can be placed on this tile given
    /// `used` units already allocated.
    pub fn satisfies(&self, amount: i64, used: i64) -> bool {
        amount >= self.min_unit
            && amount <= self.max_unit
            && amount % self.step_size == 0
            && amount <= self.remaining(used)
    }

    /// Insert or replace the tile for `(provider, class)` and bump the
    /// provider's generation in the same transaction scope.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert<'a>(
        conn: &mut DbConnection<'a>,
        resource_provider_id: i64,
        resource_class_id: i32,
        total: i64,
        reserved: i64,
        min_unit: i64,
        max_unit: i64,
        step_size: i64,
        allocation_ratio: f64,
    ) -> Result<Self, diesel::result::Error> {
        let inventory = diesel::insert_into(inventories::table)
            .values((
                inventories::resource_provider_id.eq(resource_provider_id),
                inventories::resource_class_id.eq(resource_class_id),
                inventories::total.eq(total),
                inventories::reserved.eq(reserved),
                inventories::min_unit.eq(min_unit),
                inventories::max_unit.eq(max_unit),
                inventories::step_size.eq(step_size),
                inventories::allocation_ratio.eq(allocation_ratio),
            ))
            .on_conflict((
                inventories::resource_provider_id,
                inventories::resource_class_id,
            ))
            .do_update()
            .set((
                inventories::total.eq(total),
                inventories::reserved.eq(reserved),
                inventories::min_unit.eq(min_unit),
                inventories::max_unit.eq(max_unit),
                inventories::step_size.eq(step_size),
                inventories::allocation_ratio.eq(allocation_ratio),
            ))
            .returning(Inventory::as_select())
            .get_result(conn)
            .await?;

        ResourceProvider::bump_generation(conn, resource_provider_id).await?;

        Ok(inventory)
    }

    /// All tiles whose class is in `class_ids`, across every provider.
    pub async fn get_by_classes<'a>(
        conn: &mut DbConnection<'a>,
        class_ids: Vec<i32>,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        inventories::table
            .filter(inventories::resource_class_id.eq_any(class_ids))
            .load::<Self>(conn)
            .await
    }
}
