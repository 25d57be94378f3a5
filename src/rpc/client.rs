use log::debug;
use std::time::Duration;
use thiserror::Error;

use crate::logic::{FieldMaskResponder, ResponderError};
use crate::model::{FieldSet, RawRecord};
use crate::rpc::wire::{
    GetRecordRequest, GetRecordResponse, RpcErrorBody, RpcErrorCode, UpsertRecordRequest,
    UpsertRecordResponse,
};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: String, key: String },

    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("backend rejected request ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("backend transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Gateway view of a backend: field-masked reads and unmasked writes
#[async_trait::async_trait]
pub trait RecordBackend: Send + Sync {
    async fn get_record(
        &self,
        entity: &str,
        key: &str,
        fields: &FieldSet,
    ) -> Result<RawRecord, RpcError>;

    async fn upsert_record(&self, entity: &str, record: RawRecord) -> Result<RawRecord, RpcError>;
}

/// HTTP/JSON client for a backend service.
///
/// Holds one connection pool for the lifetime of the gateway; it is shared
/// across requests and never mutated by them.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn error_from(response: reqwest::Response, entity: &str, key: &str) -> RpcError {
        let status = response.status().as_u16();
        let body = response.json::<RpcErrorBody>().await.ok();
        match body {
            Some(RpcErrorBody {
                code: RpcErrorCode::NotFound,
                ..
            }) => RpcError::NotFound {
                entity: entity.to_string(),
                key: key.to_string(),
            },
            Some(RpcErrorBody {
                code: RpcErrorCode::UnknownEntity,
                ..
            }) => RpcError::UnknownEntity(entity.to_string()),
            Some(body) => RpcError::Status {
                status,
                message: body.error,
            },
            None => RpcError::Status {
                status,
                message: "unreadable error body".to_string(),
            },
        }
    }
}

#[async_trait::async_trait]
impl RecordBackend for BackendClient {
    async fn get_record(
        &self,
        entity: &str,
        key: &str,
        fields: &FieldSet,
    ) -> Result<RawRecord, RpcError> {
        let url = format!("{}/rpc/{}/get", self.base_url, entity);
        debug!("POST {} key={} fields={}", url, key, fields);

        let response = self
            .client
            .post(&url)
            .json(&GetRecordRequest {
                key: key.to_string(),
                fields: fields.clone(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, entity, key).await);
        }

        Ok(response.json::<GetRecordResponse>().await?.record)
    }

    async fn upsert_record(&self, entity: &str, record: RawRecord) -> Result<RawRecord, RpcError> {
        let url = format!("{}/rpc/{}/upsert", self.base_url, entity);
        let key = record
            .get(crate::model::KEY_FIELD)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        debug!("POST {} key={}", url, key);

        let response = self
            .client
            .post(&url)
            .json(&UpsertRecordRequest { record })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, entity, &key).await);
        }

        Ok(response.json::<UpsertRecordResponse>().await?.record)
    }
}

/// In-process transport: the gateway talks to a responder living in the
/// same process, with the same error mapping as the HTTP client.
#[async_trait::async_trait]
impl RecordBackend for FieldMaskResponder {
    async fn get_record(
        &self,
        entity: &str,
        key: &str,
        fields: &FieldSet,
    ) -> Result<RawRecord, RpcError> {
        self.respond(entity, key, fields.clone())
            .await
            .map(|response| response.record)
            .map_err(RpcError::from)
    }

    async fn upsert_record(&self, entity: &str, record: RawRecord) -> Result<RawRecord, RpcError> {
        self.upsert(entity, record).await.map_err(RpcError::from)
    }
}

impl From<ResponderError> for RpcError {
    fn from(err: ResponderError) -> Self {
        match err {
            ResponderError::NotFound { entity, key } => RpcError::NotFound { entity, key },
            ResponderError::UnknownEntity(entity) => RpcError::UnknownEntity(entity),
            ResponderError::InvalidRecord { .. } => RpcError::Status {
                status: 400,
                message: err.to_string(),
            },
            ResponderError::Store(_) => RpcError::Status {
                status: 500,
                message: err.to_string(),
            },
        }
    }
}
