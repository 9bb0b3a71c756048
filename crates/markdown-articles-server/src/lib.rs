pub mod fetch;
pub mod routes;
pub mod service;
pub mod signature;
pub mod store;

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderName;
use clap::{Args, Parser, Subcommand};
use markdown_articles::{parse_document, Document, ParserOptions};
use markdown_articles_config::{Config, LoadOptions, ParserSettings, Usage};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use fetch::{DocumentSource, FileSource, HttpSource};
use routes::AppState;
use service::ArticleService;
use signature::SignatureVerifier;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file applied on top of .markdown-articles.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the document and serve it over HTTP (default)
    Serve(ServeArgs),
    /// Parse a markdown file and print the document as JSON
    Parse(ParseArgs),
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// URL of the markdown document
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,

    /// Serve a local markdown file instead of fetching a URL
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// File holding the webhook secret
    #[arg(long, value_name = "FILE")]
    secret_file: Option<PathBuf>,

    #[command(flatten)]
    parser: ParserArgs,
}

#[derive(Args)]
struct ParseArgs {
    /// Path to markdown file, or `-` for stdin
    #[arg(value_name = "FILE")]
    path: PathBuf,

    #[command(flatten)]
    parser: ParserArgs,
}

#[derive(Args, Default)]
struct ParserArgs {
    /// Prefix of article headings, e.g. "### "
    #[arg(long)]
    section_prefix: Option<String>,

    /// Line that separates the description from the articles
    #[arg(long)]
    divider: Option<String>,
}

impl ParserArgs {
    fn apply(self, settings: &mut ParserSettings) {
        if let Some(prefix) = self.section_prefix {
            settings.section_prefix = prefix;
        }
        if let Some(divider) = self.divider {
            settings.divider = divider;
        }
    }
}

/// Entry point for the binary.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = LoadOptions::default();
    if let Some(path) = cli.config {
        options = options.with_override_path(path);
    }
    let mut config = Config::load(options)?;
    for layer in &config.sources.layers {
        tracing::debug!(kind = %layer.kind, path = ?layer.path, "config layer");
    }

    match cli.command.unwrap_or_else(|| Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            let file = args.file.clone();
            apply_serve_args(&mut config, args);
            config.validate(serve_usage(file.as_deref()))?;
            serve(config, file).await
        }
        Command::Parse(args) => {
            args.parser.apply(&mut config.parser);
            config.validate(Usage::Parse)?;
            print_document(&args.path, &parser_options(&config.parser))
        }
    }
}

fn serve_usage(file: Option<&Path>) -> Usage {
    match file {
        Some(_) => Usage::ServeFile,
        None => Usage::ServeUrl,
    }
}

fn apply_serve_args(config: &mut Config, args: ServeArgs) {
    if let Some(bind) = args.bind {
        config.server.bind = bind.to_string();
    }
    if let Some(url) = args.url {
        config.source.url = url;
    }
    if let Some(path) = args.secret_file {
        config.webhook.secret_file = Some(path);
    }
    args.parser.apply(&mut config.parser);
}

/// Initialises tracing. `RUST_LOG` wins over the verbosity flag.
pub fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Ignore error if a subscriber is already set (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn parser_options(settings: &ParserSettings) -> ParserOptions {
    ParserOptions {
        title_prefix: settings.title_prefix.clone(),
        divider: settings.divider.clone(),
        section_prefix: settings.section_prefix.clone(),
        fence_marker: settings.fence_marker.clone(),
    }
}

/// Builds the service state from configuration. Fails if the first fetch fails.
pub async fn build_state(config: &Config, source: Arc<dyn DocumentSource>) -> Result<AppState> {
    let secret = config.webhook.read_secret()?;
    if secret.is_empty() {
        tracing::warn!("no webhook secret configured, signatures use an empty key");
    }

    let signature_header = HeaderName::try_from(config.webhook.signature_header.as_str())
        .with_context(|| {
            format!(
                "invalid signature header name: {}",
                config.webhook.signature_header
            )
        })?;

    let service = ArticleService::init(source, parser_options(&config.parser))
        .await
        .context("initial document fetch failed")?;

    Ok(AppState {
        service: Arc::new(service),
        verifier: Arc::new(SignatureVerifier::new(secret)),
        signature_header,
    })
}

async fn serve(config: Config, file: Option<PathBuf>) -> Result<()> {
    let source: Arc<dyn DocumentSource> = match file {
        Some(path) => Arc::new(FileSource::new(path)),
        None => Arc::new(HttpSource::new(&config.source.url, config.source.timeout)?),
    };

    let state = build_state(&config, source).await?;
    let app = routes::router(state, &config.server.route);

    let addr = config.server.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        route = %config.server.route,
        "serving articles"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

fn print_document(path: &Path, options: &ParserOptions) -> Result<()> {
    let document = read_document(path, options).with_context(|| {
        format!(
            "Unable to parse document at path or stream: {}",
            path.display()
        )
    })?;

    match write_json(&document) {
        Ok(()) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(err) => Err(err).context("Failed to write document"),
    }
}

fn write_json(document: &Document) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    serde_json::to_writer_pretty(&mut handle, document)?;
    writeln!(handle)?;
    handle.flush()
}

fn read_document(path: &Path, options: &ParserOptions) -> Result<Document> {
    if path == Path::new("-") {
        let stdin = io::stdin();
        Ok(parse_document(stdin.lock(), options)?)
    } else {
        let file = File::open(path)?;
        Ok(parse_document(BufReader::new(file), options)?)
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}
