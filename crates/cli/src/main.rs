use anyhow::Context;
use books_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "books-cli")]
#[command(about = "Run and inspect the books service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API until interrupted
    Serve {
        /// Override the configured listen port
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// Print the merged OpenAPI document
    Openapi,
    /// Print the effective settings as JSON
    Settings,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().with_context(|| "failed to load books settings")?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            books_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "books-cli serve");

            tokio::runtime::Runtime::new()
                .context("failed to start tokio runtime")?
                .block_on(books_service::run(settings))
        }
        Command::Openapi => {
            let registry = books_service::build_registry(&settings)?;
            let document = books_http::router::openapi_document(&registry);
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}
