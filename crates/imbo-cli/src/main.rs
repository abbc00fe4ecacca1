//! Imbo CLI — build and sign Imbo URLs from the command line.
//!
//! Set IMBO_HOSTS, IMBO_PUBLIC_KEY and IMBO_PRIVATE_KEY (and optionally
//! IMBO_USER). Nothing is sent over the network.

use anyhow::Context;
use clap::{Parser, Subcommand};
use imbo_cli::{init_tracing, log_error, parse_timestamp, UrlOutput};
use imbo_client::ImboClient;
use imbo_core::ImagesQuery;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "imbo", about = "Imbo URL builder and signer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an image URL with transformations
    Url {
        /// Image identifier
        image_id: String,
        /// Transformation in `name:key=value,...` form (repeatable, applied in order)
        #[arg(long = "transform", short = 't')]
        transformations: Vec<String>,
        /// Output format: png, jpg or gif
        #[arg(long)]
        format: Option<String>,
        /// Omit the access token
        #[arg(long)]
        no_token: bool,
    },
    /// Sign a URL for a mutating request
    Sign {
        /// HTTP method (PUT, POST, DELETE)
        method: String,
        /// URL or path to sign
        url: String,
        /// RFC 3339 timestamp or epoch millis (defaults to now)
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Build the image listing URL
    Images {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "20")]
        limit: u32,
        /// Include metadata in the listing
        #[arg(long)]
        metadata: bool,
        /// Restrict to these image identifiers (repeatable)
        #[arg(long = "id")]
        ids: Vec<String>,
        /// Sort expression such as `added:desc` (repeatable)
        #[arg(long)]
        sort: Vec<String>,
    },
    /// Build the metadata URL of an image
    Metadata {
        /// Image identifier
        image_id: String,
    },
    /// Build the user URL
    User,
    /// Build the status URL
    Status,
    /// Build the stats URL
    Stats,
    /// Show the loaded configuration (private key omitted)
    Config,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    run(cli).inspect_err(log_error)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let client = ImboClient::from_env().context(
        "Failed to create Imbo client. Set IMBO_HOSTS, IMBO_PUBLIC_KEY and IMBO_PRIVATE_KEY",
    )?;

    match cli.command {
        Commands::Url {
            image_id,
            transformations,
            format,
            no_token,
        } => {
            let mut url = client.image_url(&image_id)?;
            for transformation in &transformations {
                url.append(transformation);
            }
            if let Some(format) = format {
                url.convert(&format)?;
            }
            url.set_access_token(!no_token);
            tracing::debug!(count = transformations.len(), "Applied transformations");
            print_json(&UrlOutput::from(&url))?;
        }
        Commands::Sign {
            method,
            url,
            timestamp,
        } => {
            let signed = match timestamp {
                Some(ts) => client.signed_resource_url(&method, &url, &parse_timestamp(&ts)?),
                None => client.signed_resource_url_now(&method, &url),
            };
            print_json(&serde_json::json!({ "signed_url": signed }))?;
        }
        Commands::Images {
            page,
            limit,
            metadata,
            ids,
            sort,
        } => {
            let query = ImagesQuery::new()
                .page(page)
                .limit(limit)
                .metadata(metadata)
                .ids(ids)
                .sort(sort);
            let url = client.images_url(Some(&query))?;
            print_json(&UrlOutput::from(&url))?;
        }
        Commands::Metadata { image_id } => {
            let url = client.metadata_url(&image_id)?;
            print_json(&UrlOutput::from(&url))?;
        }
        Commands::User => {
            print_json(&UrlOutput::from(&client.user_url()?))?;
        }
        Commands::Status => {
            print_json(&UrlOutput::from(&client.status_url()?))?;
        }
        Commands::Stats => {
            print_json(&UrlOutput::from(&client.stats_url()?))?;
        }
        Commands::Config => {
            print_json(client.config())?;
        }
    }

    Ok(())
}
