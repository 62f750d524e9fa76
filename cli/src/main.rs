use clap::Parser;
mod commands;
use commands::cli::{self, Commands};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use vecdex_core::api::{
    apply_env_overrides, load_default, load_from_path, AppConfig, CliError, LoggingConfig,
};
use vecdex_plugins::VectorStoreFacade;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(&args).map_err(|e| CliError::Config(format!("{e:#}")))?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    match args.command {
        Commands::Init => commands::collection::init(&cfg).await,
        Commands::Drop => commands::collection::drop_collection(&cfg).await,
        Commands::Ingest(ingest_args) => {
            let facade = VectorStoreFacade::new(cfg);
            let result = commands::ingest::run(ingest_args, &facade).await;
            finish(&facade, result).await
        }
        Commands::Query(query_args) => {
            let facade = VectorStoreFacade::new(cfg);
            let result = commands::query::run(query_args, &facade).await;
            finish(&facade, result).await
        }
    }
}

fn load_config(args: &cli::Args) -> anyhow::Result<AppConfig> {
    match &args.config {
        Some(path) => {
            let mut cfg = load_from_path(path)?;
            apply_env_overrides(&mut cfg, |name| std::env::var(name).ok())?;
            Ok(cfg)
        }
        None => load_default(),
    }
}

async fn finish(
    facade: &VectorStoreFacade,
    result: Result<i32, CliError>,
) -> Result<i32, CliError> {
    if let Err(e) = facade.shutdown().await {
        tracing::warn!("shutdown failed: {}", e);
    }
    result
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("vecdex"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("vecdex.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    // Results go to stdout; keep logs on stderr.
    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
