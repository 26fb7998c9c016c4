//! Gateway binary: configuration, wiring and lifecycle.
//!
//! Constructs every shared component once (store → registry client →
//! breaker → dispatcher → registrar) and passes them by `Arc` into the
//! request path; there is no ambient global state.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use service_gateway::config::{load_config, GatewayConfig};
use service_gateway::dispatch::Dispatcher;
use service_gateway::http::HttpServer;
use service_gateway::lifecycle::{Registrar, Shutdown};
use service_gateway::observability::{logging, metrics};
use service_gateway::registry::{RedisStore, RegistryClient};
use service_gateway::resilience::CircuitBreaker;

#[derive(Parser)]
#[command(name = "service-gateway")]
#[command(about = "Registry-backed dynamic API gateway", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        address = %config.http.address,
        port = config.http.port,
        registry = %format!("{}:{}", config.registry.host, config.registry.port),
        breaker = %config.circuit_breaker.name,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = Arc::new(RedisStore::new(&config.registry)?);
    let registry = Arc::new(RegistryClient::new(store));
    let breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker.clone()));
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), Arc::clone(&breaker)));
    let registrar = Registrar::new(Arc::clone(&registry));

    let bind = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let registration_id = registrar
        .publish_http_endpoint(
            &config.service.name,
            &config.http.address,
            config.http.port,
            &config.service.api_name,
        )
        .await?;
    tracing::info!(registration_id = %registration_id, "Gateway endpoint published");

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    let server = HttpServer::new(config, dispatcher);
    server.run(listener, shutdown.subscribe()).await?;

    // every unregistration settles before the process lets go of the registry
    if let Err(err) = registrar.stop().await {
        tracing::error!(error = %err, "Shutdown left records registered");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
