use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod ask;
pub mod chat;
pub mod serve;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session
    Chat {
        /// Model identifier passed through to the completion endpoint
        #[arg(long)]
        model: Option<String>,
        /// Sampling temperature between 0.0 and 1.0
        #[arg(long)]
        temperature: Option<f32>,
    },
    /// Ask a single question and print the answer
    Ask {
        question: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        temperature: Option<f32>,
    },
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

/// Logs go to stderr so they never interleave with answers on
/// stdout. Interactive commands stay quiet unless `RUST_LOG` says
/// otherwise.
fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Chat { model, temperature }) => {
            init_tracing(&format!("{}=warn", env!("CARGO_CRATE_NAME")));
            let config = AppConfig::from_env()?.with_overrides(model, temperature)?;
            chat::run(config).await?;
        }
        Some(Command::Ask {
            question,
            model,
            temperature,
        }) => {
            init_tracing(&format!("{}=warn", env!("CARGO_CRATE_NAME")));
            let config = AppConfig::from_env()?.with_overrides(model, temperature)?;
            ask::run(config, &question).await?;
        }
        Some(Command::Serve { host, port }) => {
            // axum logs rejections from built-in extractors with the `axum::rejection`
            // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
            init_tracing(&format!(
                "{}=debug,tower_http=debug,axum::rejection=trace",
                env!("CARGO_CRATE_NAME")
            ));
            let config = AppConfig::from_env()?;
            serve::run(host, port, config).await?;
        }
        None => {}
    }

    Ok(())
}
