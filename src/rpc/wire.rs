use serde::{Deserialize, Serialize};

use crate::model::{FieldSet, RawRecord};

/// Field-mask request: the key to look up and the fields to return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetRecordRequest {
    pub key: String,
    pub fields: FieldSet,
}

/// Partial record; fields outside the mask are omitted entirely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetRecordResponse {
    pub record: RawRecord,
    #[serde(default)]
    pub fields: FieldSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertRecordRequest {
    pub record: RawRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertRecordResponse {
    pub record: RawRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    NotFound,
    UnknownEntity,
    InvalidRecord,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub error: String,
    pub code: RpcErrorCode,
}

impl RpcErrorBody {
    pub fn new(code: RpcErrorCode, message: &str) -> Self {
        Self {
            error: message.to_string(),
            code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn test_request_wire_shape() {
        let request = GetRecordRequest {
            key: "p1".to_string(),
            fields: ["name", "price"].into_iter().collect(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "key": "p1", "fields": ["name", "price"] })
        );
    }

    #[test]
    fn test_response_omits_absent_fields() {
        let response = GetRecordResponse {
            record: RawRecord::from([("name".to_string(), Value::from("Widget"))]),
            fields: ["name"].into_iter().collect(),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({ "record": { "name": "Widget" }, "fields": ["name"] })
        );
    }

    #[test]
    fn test_error_code_format() {
        let body: RpcErrorBody =
            serde_json::from_str(r#"{"error": "Product 'x' not found", "code": "NOT_FOUND"}"#)
                .unwrap();
        assert_eq!(body.code, RpcErrorCode::NotFound);
    }
}
