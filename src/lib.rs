pub mod api;
pub mod config;
pub mod events;
pub mod logic;
pub mod model;
pub mod rpc;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export the field-mask pipeline
pub use logic::{
    apply_mask, build, build_entity, extract, parse_operation, FieldMaskResponder,
    FieldMaskResponse, Gateway, GatewayError, ParseError, ResponderError,
};

// Export all model types
pub use model::*;

// Export transport and store types
pub use events::{EventPublisher, HttpPublisher, LogPublisher};
pub use rpc::{BackendClient, RecordBackend, RpcError};
pub use store::{MemoryStore, PostgresStore, RecordStore};

/// Initialize logging for a binary: `info` by default, overridable through
/// `RUST_LOG`, with sqlx query logs kept at `warn`
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("sqlx", log::LevelFilter::Warn)
        .try_init();
}
