use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{schema::resource_classes, DbConnection};

/// Table that holds the dynamically created (`CUSTOM_`) resource classes.
/// Standard classes never hit this table; they resolve from the
/// compile-time catalog.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = resource_classes)]
pub struct ResourceClass {
    /// Raw row id. Callers offset this into the shared class-id space so
    /// custom ids can never collide with standard indices.
    pub id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ResourceClass {
    pub async fn create<'a>(
        conn: &mut DbConnection<'a>,
        name: String,
    ) -> Result<Self, diesel::result::Error> {
        let class = diesel::insert_into(resource_classes::table)
            .values(resource_classes::name.eq(name))
            .returning(ResourceClass::as_select())
            .get_result(conn)
            .await?;
        Ok(class)
    }

    pub async fn get_by_names<'a>(
        conn: &mut DbConnection<'a>,
        names: Vec<String>,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        resource_classes::table
            .filter(resource_classes::name.eq_any(names))
            .load::<Self>(conn)
            .await
    }
}
