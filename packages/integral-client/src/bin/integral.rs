//! Integral calculator CLI
//!
//! # Usage
//!
//! ```bash
//! # Indefinite integral, text output
//! integral calculate --function "x^2 * sin(x)"
//!
//! # Definite integral, HTML page written to a file
//! integral calculate -f "exp(-x^2)" --lower 0 --upper 1 --format html -o result.html
//!
//! # Validate input only (no network)
//! integral check -f "x // 2"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use integral_client::{
    ClientConfig, DelimiterCheck, FormInput, FormOrchestrator, HttpCalculationService, Page,
    Renderer, SubmitOutcome,
};
use integral_core::validate_form;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "integral")]
#[command(about = "Integral calculator client for a remote /calculate service", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a calculation and render the result
    Calculate {
        /// Function of x to integrate
        #[arg(short, long)]
        function: String,

        /// Lower limit (definite integral)
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        lower: String,

        /// Upper limit (definite integral)
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        upper: String,

        /// Server base URL (overrides config and environment)
        #[arg(short, long)]
        server: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report unbalanced braces in the returned LaTeX
        #[arg(long)]
        check_markup: bool,
    },

    /// Validate the input without contacting the server
    Check {
        #[arg(short, long)]
        function: String,

        #[arg(long, default_value = "", allow_hyphen_values = true)]
        lower: String,

        #[arg(long, default_value = "", allow_hyphen_values = true)]
        upper: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Html,
    Json,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::from_yaml(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    Ok(config.with_env()?)
}

fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render_output(page: &Page, format: OutputFormat, title: &str) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Text => page.to_text(),
        OutputFormat::Html => page.to_html_document(title),
        OutputFormat::Json => serde_json::to_string_pretty(page)?,
    })
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Check {
            function,
            lower,
            upper,
        } => {
            init_tracing(&config);
            match validate_form(&function, &lower, &upper) {
                Ok(request) => {
                    println!("OK: {}", serde_json::to_string(&request)?);
                    Ok(true)
                }
                Err(e) => {
                    println!("Invalid {}: {}", e.field(), e);
                    Ok(false)
                }
            }
        }
        Commands::Calculate {
            function,
            lower,
            upper,
            server,
            format,
            output,
            check_markup,
        } => {
            if let Some(server) = server {
                config = config.with_base_url(server)?;
            }
            init_tracing(&config);

            let service = Arc::new(HttpCalculationService::new(config.clone())?);
            let mut renderer = Renderer::new().with_asset_base(config.clone());
            if check_markup {
                renderer = renderer.with_typesetter(Arc::new(DelimiterCheck));
            }

            let page = Arc::new(Mutex::new(Page::new()));
            let orchestrator = FormOrchestrator::new(service, page.clone()).with_renderer(renderer);

            let form = FormInput::new(function.as_str()).with_limits(lower, upper);
            let outcome = orchestrator.submit(&form).await;

            if let SubmitOutcome::Invalid(e) = &outcome {
                eprintln!("Invalid {}: {}", e.field(), e);
                return Ok(false);
            }

            let title = format!("∫ {} dx", function.trim());
            let rendered = render_output(&page.lock(), format, &title)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("Wrote {}", path.display());
                }
                None => print!("{}", rendered),
            }

            Ok(outcome.is_rendered())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
