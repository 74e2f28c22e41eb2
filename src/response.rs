//! Response bodies shared by the table routes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a table listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResults {
    pub page: u64,
    pub page_size: u64,
    pub data: Vec<Value>,
    pub total_records: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_snake_case_fields() {
        let p = PagedResults {
            page: 1,
            page_size: 2,
            data: vec![json!({ "id": 3 })],
            total_records: 5,
        };
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            json!({ "page": 1, "page_size": 2, "data": [{ "id": 3 }], "total_records": 5 })
        );
    }
}
