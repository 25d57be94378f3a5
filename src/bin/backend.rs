use axum::serve;
use field_gateway::api::routes::create_backend_router;
use field_gateway::config::AppConfig;
use field_gateway::logic::FieldMaskResponder;
use field_gateway::model::SchemaRegistry;
use field_gateway::seed;
use field_gateway::store::{MemoryStore, PostgresStore, RecordStore};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    field_gateway::init_logging();

    println!("Field backend: field-mask record service");

    let config = AppConfig::load()?;
    let schemas = Arc::new(SchemaRegistry::builtin());

    let store: Arc<dyn RecordStore> = match config.database_url() {
        Some(database_url) => {
            println!("Connecting to PostgreSQL...");
            let postgres_store = PostgresStore::new(
                &database_url,
                config.database.max_connections.unwrap_or(20),
            )
            .await?;

            println!("Creating entity tables...");
            postgres_store
                .migrate(schemas.iter().map(|schema| schema.as_ref()))
                .await?;
            Arc::new(postgres_store)
        }
        None => {
            println!("No database configured, using in-memory store");
            let memory_store = MemoryStore::new();
            if config.database.seed {
                println!("Loading seed data...");
                seed::load_seed_data(&memory_store).await?;
            }
            Arc::new(memory_store)
        }
    };

    let responder = FieldMaskResponder::new(store, schemas);
    let app = create_backend_router().with_state(Arc::new(responder));

    let bind_address = config.backend_address();
    let listener = TcpListener::bind(&bind_address).await?;
    println!("Backend running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
