//! signpost: navigate a workspace of TOML menu files.
//!
//! ```bash
//! # Interactive shell (default), reading ./signpost.toml
//! signpost
//! signpost --config menus/signpost.toml shell
//!
//! # Lint every link in the workspace; exits 1 on problems
//! signpost check
//! signpost check --syntax-only
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

mod check;
mod shell;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use signpost_kernel::{
    CacheWatcher, DEFAULT_CONFIG_FILE, LocalLoader, NavigatorConfig, ResourceCache,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::shell::{HELP, Shell};

/// Navigate TOML menu workspaces.
#[derive(Parser, Debug)]
#[command(name = "signpost", version)]
#[command(about = "Navigate and check signpost menu workspaces")]
struct Args {
    /// Path to the navigator config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Interactive navigation shell (default)
    Shell,
    /// Report broken links in every resource file
    Check {
        /// Only parse links, without loading their targets
        #[arg(long)]
        syntax_only: bool,
    },
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(feature = "telemetry")]
fn init_logging() -> Option<signpost_telemetry::OtelGuard> {
    let registry = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr));

    if signpost_telemetry::otel_enabled() {
        match signpost_telemetry::otel_layer("signpost") {
            Ok((otel_layer, guard)) => {
                registry.with(otel_layer).init();
                return Some(guard);
            }
            Err(e) => eprintln!("telemetry disabled: {e}"),
        }
    }
    registry.init();
    None
}

#[cfg(not(feature = "telemetry"))]
fn init_logging() -> Option<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    None
}

#[tokio::main]
async fn main() -> ExitCode {
    let _otel_guard = init_logging();
    let args = Args::parse();

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let config = NavigatorConfig::load(&args.config)
        .await
        .with_context(|| format!("loading {}", args.config.display()))?;

    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            run_shell(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { syntax_only } => {
            let problems = check::run(&config, syntax_only, &mut std::io::stdout()).await?;
            Ok(if problems == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn run_shell(config: &NavigatorConfig) -> anyhow::Result<()> {
    let loader = LocalLoader::new(&config.workspace_root);
    let cache = Arc::new(ResourceCache::new(Arc::new(loader.clone())));
    let navigator = config.build_navigator(Arc::clone(&cache))?;

    let watcher = if config.watch {
        Some(CacheWatcher::start(&loader, Arc::clone(&cache))?)
    } else {
        None
    };

    tracing::info!(
        root = %loader.root().display(),
        home = %config.home,
        watch = config.watch,
        "starting navigation shell"
    );
    println!("{HELP}\n");

    let out = Arc::new(Mutex::new(std::io::stdout()));
    let mut shell = Shell::new(navigator, config.principal(), out);
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let result = shell.run(input).await;
    tracing::info!(
        session = %shell.session().id,
        depth = shell.session().breadcrumbs().depth(),
        "shell closed"
    );

    if let Some(watcher) = watcher {
        watcher.stop();
    }
    result
}
