use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use log::error;
use serde::Serialize;
use std::sync::Arc;

use crate::logic::{FieldMaskResponder, Gateway, ResponderError};
use crate::model::{GraphQLRequest, GraphQLResponse, ProductUpdateReport};
use crate::rpc::{
    GetRecordRequest, GetRecordResponse, RpcErrorBody, RpcErrorCode, UpsertRecordRequest,
    UpsertRecordResponse,
};

pub type BackendState = Arc<FieldMaskResponder>;
pub type GatewayState = Arc<Gateway>;

type RpcResult<T> = Result<Json<T>, (StatusCode, Json<RpcErrorBody>)>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

fn rpc_error(err: ResponderError) -> (StatusCode, Json<RpcErrorBody>) {
    let (status, code) = match &err {
        ResponderError::NotFound { .. } => (StatusCode::NOT_FOUND, RpcErrorCode::NotFound),
        ResponderError::UnknownEntity(_) => (StatusCode::NOT_FOUND, RpcErrorCode::UnknownEntity),
        ResponderError::InvalidRecord { .. } => {
            (StatusCode::BAD_REQUEST, RpcErrorCode::InvalidRecord)
        }
        ResponderError::Store(e) => {
            error!("[backend] store failure: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, RpcErrorCode::Internal)
        }
    };
    (status, Json(RpcErrorBody::new(code, &err.to_string())))
}

/// Field-masked read: `POST /rpc/:entity/get`
pub async fn get_record(
    State(responder): State<BackendState>,
    Path(entity): Path<String>,
    RequestJson(request): RequestJson<GetRecordRequest>,
) -> RpcResult<GetRecordResponse> {
    let response = responder
        .respond(&entity, &request.key, request.fields)
        .await
        .map_err(rpc_error)?;

    Ok(Json(GetRecordResponse {
        record: response.record,
        fields: response.fields,
    }))
}

/// Unmasked write: `POST /rpc/:entity/upsert`
pub async fn upsert_record(
    State(responder): State<BackendState>,
    Path(entity): Path<String>,
    RequestJson(request): RequestJson<UpsertRecordRequest>,
) -> RpcResult<UpsertRecordResponse> {
    let record = responder
        .upsert(&entity, request.record)
        .await
        .map_err(rpc_error)?;

    Ok(Json(UpsertRecordResponse { record }))
}

/// GraphQL entry point: `POST /graphql`
pub async fn graphql(
    State(gateway): State<GatewayState>,
    RequestJson(request): RequestJson<GraphQLRequest>,
) -> Json<GraphQLResponse> {
    Json(gateway.execute(&request).await)
}

/// Batch product-update announcement: `POST /update_product/`
pub async fn update_products(
    State(gateway): State<GatewayState>,
    RequestJson(products): RequestJson<Vec<serde_json::Map<String, serde_json::Value>>>,
) -> Json<ProductUpdateReport> {
    Json(gateway.publish_product_updates(products).await)
}
