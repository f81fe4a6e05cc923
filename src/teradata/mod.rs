//! Teradata destination
//!
//! [`TeradataClient`] talks to the Query Service. [`TeradataLoader`] runs the
//! drop/create/insert sequence against any [`Warehouse`].

mod client;
mod loader;
mod warehouse;

pub use client::{TeradataClient, catalog_query};
pub use loader::{TeradataLoader, create_table_sql, insert_sql};
pub use warehouse::{Warehouse, WarehouseError};
