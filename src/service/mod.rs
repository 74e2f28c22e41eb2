//! CrudService and the record model contract.

mod crud;
mod record;
pub use crud::{build_list_query, parse_order, CrudService, DDL_TABLE};
pub use record::{Model, Record};
