use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use titlecache::api::{ApiServer, ApiServerConfig};
use titlecache::{load_config, read_uri_file, run_batch, write_results, RunMode};
use titlecache_core::{ActionRequest, Envelope, TitleCache};

#[derive(Parser)]
#[command(name = "titlecache")]
#[command(about = "Read-through title cache for RDF resources", long_about = None)]
struct Cli {
    /// Configuration file (YAML); defaults to ~/.config/titlecache/config.yaml if present.
    /// Without one, `serve` caches in memory and every other command under ~/.cache/titlecache
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write each result envelope as YAML to DIR/result-{i}.txt
    #[arg(short, long, global = true, value_name = "DIR")]
    results: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate the cache of a graph from the triple store
    Create {
        /// Graph to populate (defaults to the configured graph)
        #[arg(short, long)]
        graph: Option<String>,
    },

    /// Look up titles
    Get {
        /// Comma separated resource URIs
        #[arg(short, long)]
        uris: Option<String>,

        /// File with one URI per line
        #[arg(long, value_name = "FILE")]
        uris_from: Option<PathBuf>,

        /// Preferred language (defaults to the configured default language)
        #[arg(short, long)]
        lang: Option<String>,

        /// Graph to read (defaults to the configured graph)
        #[arg(short, long)]
        graph: Option<String>,
    },

    /// Run the actions listed in a YAML file
    Batch {
        /// YAML file with an `actions` list
        #[arg(long = "action-from", value_name = "FILE")]
        action_from: PathBuf,
    },

    /// Start API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout carries only the JSON result
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "titlecache=info,titlecache_core=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mode = match cli.command {
        Commands::Serve { .. } => RunMode::Server,
        _ => RunMode::OneShot,
    };

    let config = match load_config(cli.config.as_deref(), mode) {
        Ok(config) => config,
        Err(e) if mode == RunMode::Server => return Err(e.into()),
        Err(e) => return emit(&[e.into()], cli.results.as_deref()),
    };
    let service = TitleCache::new(config);

    let envelopes = match cli.command {
        Commands::Create { graph } => {
            let mut request = ActionRequest::new("create");
            request.graph = graph;
            vec![service.run(request).await]
        }

        Commands::Get {
            uris,
            uris_from,
            lang,
            graph,
        } => {
            let uris = match (uris_from, uris) {
                (Some(path), _) => match read_uri_file(&path) {
                    Ok(uris) => uris,
                    Err(e) => return emit(&[e.into()], cli.results.as_deref()),
                },
                (None, Some(raw)) => ActionRequest::parse_uris(&raw),
                (None, None) => Vec::new(),
            };

            let request = ActionRequest {
                action: Some("get".to_string()),
                graph,
                uris,
                lang,
                ..Default::default()
            };
            vec![service.run(request).await]
        }

        Commands::Batch { action_from } => run_batch(&service, &action_from).await,

        Commands::Serve { host, port } => {
            let server = ApiServer::new(ApiServerConfig { host, port }, service);
            server.start().await?;
            return Ok(());
        }
    };

    emit(&envelopes, cli.results.as_deref())
}

/// Print the envelopes as a JSON array and optionally write result files
fn emit(envelopes: &[Envelope], results: Option<&Path>) -> Result<()> {
    if let Some(dir) = results {
        if let Err(e) = write_results(dir, envelopes) {
            warn!("Failed to write results: {:#}", e);
        }
    }

    println!("{}", serde_json::to_string(envelopes)?);
    Ok(())
}
