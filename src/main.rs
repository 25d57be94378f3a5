use axum::serve;
use field_gateway::api::routes::create_gateway_router;
use field_gateway::config::AppConfig;
use field_gateway::events::{EventPublisher, HttpPublisher, LogPublisher};
use field_gateway::logic::Gateway;
use field_gateway::model::SchemaRegistry;
use field_gateway::rpc::BackendClient;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    field_gateway::init_logging();

    println!("Field gateway: GraphQL field-mask translator");

    // Load configuration
    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: server={}, backend={}",
        config.server_address(),
        config.backend_url()
    );

    // One long-lived client per backend, shared by every request
    let backend = BackendClient::new(&config.backend_url(), config.backend_timeout())?;

    let publisher: Arc<dyn EventPublisher> = match &config.events.endpoint {
        Some(endpoint) => {
            println!("Publishing events to {}", endpoint);
            Arc::new(HttpPublisher::new(endpoint, config.events_timeout())?)
        }
        None => {
            println!("No event bus configured, events will be logged");
            Arc::new(LogPublisher)
        }
    };

    let gateway = Gateway::new(
        Arc::new(backend),
        publisher,
        Arc::new(SchemaRegistry::builtin()),
    )
    .with_order_topic(&config.events.order_topic)
    .with_product_topic(&config.events.product_topic);

    run_server(create_gateway_router().with_state(Arc::new(gateway)), &config).await?;

    Ok(())
}

async fn run_server(app: axum::Router, config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    println!("Gateway running on http://{}/graphql", bind_address);

    serve(listener, app).await?;

    Ok(())
}
