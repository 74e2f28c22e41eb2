//! HTTP handlers for table CRUD and DDL introspection.

pub mod crud;
pub mod ddl;
pub use ddl::{ddl_all, ddl_table};
