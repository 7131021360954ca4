//! `svc-call`: issue one outbound call through the client facade.
//!
//! Useful for checking what a downstream service receives: context headers,
//! baggage, status handling, and event streams.
//!
//! ```text
//! svc-call --uid 42 --trace-id t-1 get http://svc/items -p page=2
//! svc-call --config clients.toml --client billing post-json http://svc/pay '{"amount": 3}'
//! svc-call sse http://svc/events
//! ```

use std::path::PathBuf;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use svc_call::config::{load_config, RegistryConfig};
use svc_call::http::{registry::Environment, CallResult, ClientRegistry};
use svc_call::observability::{init_logging, init_metrics, install_propagators};

#[derive(Parser)]
#[command(name = "svc-call")]
#[command(about = "Call an internal service with propagated context", long_about = None)]
struct Cli {
    /// Client registry config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Registered client to use instead of the default
    #[arg(long)]
    client: Option<String>,

    /// Expose Prometheus metrics on this address while the call runs
    #[arg(long)]
    metrics_address: Option<String>,

    /// Trace id; generated when absent
    #[arg(long)]
    trace_id: Option<String>,

    #[arg(long, default_value_t = 0)]
    uid: i64,

    #[arg(long, default_value_t = 0)]
    company_id: i64,

    #[arg(long, default_value = "")]
    platform: String,

    #[arg(long, default_value = "")]
    roles: String,

    #[arg(long, default_value = "")]
    token: String,

    /// Extra request header, `name: value`
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET with query parameters
    Get {
        url: String,
        /// Query parameter, `key=value`
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// POST a JSON document
    PostJson { url: String, body: String },
    /// POST form parameters
    PostForm {
        url: String,
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// Stream a local file as the request body
    Upload {
        url: String,
        file: PathBuf,
        #[arg(long, default_value = "POST")]
        method: String,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Open an event stream and print chunks as they arrive
    Sse {
        url: String,
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
}

fn parse_pairs(raw: &[String]) -> Result<Vec<(&str, &str)>, String> {
    raw.iter()
        .map(|p| {
            p.split_once('=')
                .ok_or_else(|| format!("expected key=value, got '{}'", p))
        })
        .collect()
}

fn parse_headers(raw: &[String]) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    for line in raw {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| format!("expected 'name: value', got '{}'", line))?;
        headers.append(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    Ok(headers)
}

fn print_result(result: CallResult) {
    println!("{}", result.status);
    for (name, value) in &result.headers {
        println!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
    println!();
    println!("{}", String::from_utf8_lossy(&result.body));
    if let Some(err) = result.error {
        eprintln!("Error: {}", err);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RegistryConfig::default(),
    };

    init_logging(&config.observability)?;
    if config.observability.install_propagators {
        install_propagators();
    }

    if let Some(address) = cli
        .metrics_address
        .as_deref()
        .or(config.observability.metrics_address.as_deref())
    {
        init_metrics(address.parse()?)?;
    }

    let registry = ClientRegistry::from_config(&config, &Environment::from_env());

    let mut ctx = registry.new_context();
    ctx.trace_id = cli
        .trace_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    ctx.user_id = cli.uid;
    ctx.company_id = cli.company_id;
    ctx.platform = cli.platform.clone();
    ctx.roles = cli.roles.clone();
    ctx.token = cli.token.clone();
    ctx.client = cli.client.clone();

    let client = registry.client_for(&ctx);
    let headers = parse_headers(&cli.headers)?;

    tracing::info!(client = %client.name(), trace_id = %ctx.trace_id, "Calling");

    match &cli.command {
        Commands::Get { url, params } => {
            let params = parse_pairs(params)?;
            print_result(client.get(&ctx, url, &params, &headers).await?);
        }
        Commands::PostJson { url, body } => {
            let body: serde_json::Value = serde_json::from_str(body)?;
            print_result(client.post_json(&ctx, url, &body, &headers).await?);
        }
        Commands::PostForm { url, params } => {
            let params = parse_pairs(params)?;
            print_result(client.post_form(&ctx, url, &params, &headers).await?);
        }
        Commands::Upload {
            url,
            file,
            method,
            content_type,
        } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())?;
            let result = client
                .upload_file(&ctx, method, url, file, content_type.as_deref(), &headers)
                .await?;
            print_result(result);
        }
        Commands::Sse { url, params } => {
            let params = parse_pairs(params)?;
            let response = client.sse_get(&ctx, url, &params, &headers).await?;
            println!("{}", response.status());

            let mut chunks = response.into_body().into_data_stream();
            while let Some(chunk) = chunks.next().await {
                print!("{}", String::from_utf8_lossy(&chunk?));
            }
        }
    }

    Ok(())
}
