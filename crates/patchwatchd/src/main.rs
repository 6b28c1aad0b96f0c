// # patchwatchd - Title Update Watcher
//
// The binary is a thin integration layer. It is responsible for:
// 1. Loading and validating config.json
// 2. Initializing logging
// 3. Wiring the transport, adapters, history store, and notifier together
// 4. Running one reconciliation cycle and mapping the outcome to an exit code
//
// All watching logic lives in patchwatch-core; the binary holds no policy.
//
// ## Configuration
//
// One JSON file, `config.json` in the working directory by default. Set
// `PATCHWATCH_CONFIG` to read a different path:
//
// ```bash
// export PATCHWATCH_CONFIG=/etc/patchwatch/config.json
//
// patchwatchd
// ```
//
// The process runs a single cycle and exits; cadence is owned by whatever
// invokes it (cron, a systemd timer, a container scheduler).

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use patchwatch_core::{Reconciler, ReconcilerEvent, WatcherConfig};

/// Exit codes for the watcher process
///
/// - 0: Clean run or interrupt (nothing lost; an interrupt just skips work
///   that the next run repeats)
/// - 1: Configuration/startup failure, or a run that could not persist its
///   history
#[derive(Debug, Clone, Copy)]
enum WatcherExitCode {
    Success = 0,
    Failure = 1,
}

impl From<WatcherExitCode> for ExitCode {
    fn from(code: WatcherExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Environment variable overriding the config file path.
const CONFIG_ENV: &str = "PATCHWATCH_CONFIG";

/// Load and validate the watcher configuration.
fn load_config() -> Result<WatcherConfig> {
    let path = env::var(CONFIG_ENV).unwrap_or_else(|_| "config.json".to_string());

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration from {}", path))?;

    let config: WatcherConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse configuration from {}", path))?;

    config.validate()?;

    Ok(config)
}

fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return WatcherExitCode::Failure.into();
        }
    };

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WatcherExitCode::Failure.into();
    }

    info!("starting patchwatchd");
    info!("configuration loaded: {} title(s)", config.titles.total());

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {}", e);
            return WatcherExitCode::Failure.into();
        }
    };

    rt.block_on(async {
        match run_watcher(config).await {
            Ok(()) => WatcherExitCode::Success,
            Err(e) => {
                error!("watcher error: {:#}", e);
                WatcherExitCode::Failure
            }
        }
    })
    .into()
}

/// Wire the components together and run one reconciliation cycle.
async fn run_watcher(config: WatcherConfig) -> Result<()> {
    let transport = patchwatch_transport::Transport::new()?;

    let adapters = patchwatch_platforms::all_adapters(&transport);
    let history = patchwatch_core::FileHistoryStore::load(&config.history_path).await?;
    let notifier = patchwatch_discord::DiscordNotifier::new(&config.webhook, transport);

    if config.debug {
        tracing::warn!("debug is active, title history will not be saved");
    }

    let (reconciler, mut events) = Reconciler::new(
        adapters,
        config.titles,
        Box::new(history),
        Box::new(notifier),
    );

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let ReconcilerEvent::Committed {
                platform,
                title_id,
                version,
            } = event
            {
                tracing::debug!("committed {} {} at {}", platform, title_id, version);
            }
        }
    });

    tokio::select! {
        result = reconciler.run(config.debug) => {
            let summary = result?;
            info!(
                "run complete: {} checked, {} updated, {} failed",
                summary.checked, summary.updated, summary.failed
            );
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, exiting without saving");
            Ok(())
        }
    }
}
