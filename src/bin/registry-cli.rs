//! Ops CLI for the shared service registry.
//!
//! Publishes, lists and unpublishes records directly against the backing
//! store the gateway reads from, which is how demo backends get registered.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use service_gateway::config::{load_config, GatewayConfig};
use service_gateway::registry::{RedisStore, RegistryClient, ServiceRecord};

#[derive(Parser)]
#[command(name = "registry-cli")]
#[command(about = "Manage records in the shared service registry", long_about = None)]
struct Cli {
    /// Gateway config file naming the registry backend; defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every published record
    List,
    /// Publish an HTTP endpoint record
    Publish {
        /// Logical service name
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "localhost")]
        host: String,

        #[arg(long)]
        port: u16,

        /// Routing prefix; defaults to the service name
        #[arg(long)]
        api_name: Option<String>,
    },
    /// Remove the record registered under the given id
    Unpublish { registration_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    let store = Arc::new(RedisStore::new(&config.registry)?);
    let registry = RegistryClient::new(store);

    match cli.command {
        Commands::List => {
            let records = registry.list(|_| true).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Publish {
            name,
            host,
            port,
            api_name,
        } => {
            let api_name = api_name.as_deref().unwrap_or(&name);
            let record = ServiceRecord::http_endpoint(&name, &host, port, api_name);
            let registration_id = registry.publish(record).await?;
            println!("{}", registration_id);
        }
        Commands::Unpublish { registration_id } => {
            registry.unpublish(&registration_id).await?;
            println!("unpublished {}", registration_id);
        }
    }

    Ok(())
}
