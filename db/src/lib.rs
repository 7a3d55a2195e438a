use diesel_async::{pooled_connection::bb8::PooledConnection, AsyncPgConnection};

pub mod models;
pub mod schema;

pub type DbConnection<'a> = PooledConnection<'a, AsyncPgConnection>;
