//! Application startup
//!
//! Stage 1 parses the command line, stage 2 loads the configuration file and
//! applies command line overrides, stage 3 wires the ledger, the offline cache
//! and the session, and hands over to a run loop.

use crate::app::cli::args::{use_color, Args, Command, ValidateArgs};
use crate::app::config::{load_settings, ConfigError, Settings};
use crate::app::runner::SessionRunner;
use crate::core::error_handling::{log_error_with_context, ContextualError};
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::styles::palette_to_clap;
use crate::ledger::client::LedgerClient;
use crate::ledger::http::HttpLedgerClient;
use crate::ledger::memory::MemoryLedger;
use crate::ledger::types::SessionId;
use crate::offline::controller::OfflineCacheController;
use crate::offline::network::{HttpNetwork, Network};
use crate::offline::storage::CacheStorage;
use crate::session::classifier::ScanSession;
use crate::session::normalize::Normalizer;
use crate::session::profile::ScanProfile;
use clap::{CommandFactory, FromArgMatches};
use std::sync::Arc;

/// Parse the command line with help styled for the terminal
fn parse_args() -> Args {
    let command = Args::command().styles(palette_to_clap(use_color(None)));
    Args::from_arg_matches(&command.get_matches()).unwrap_or_else(|e| e.exit())
}

/// Run the application; returns the process exit code
pub async fn startup() -> i32 {
    let args = parse_args();

    let mut settings = match load_settings(args.config_file.as_deref()).await {
        Ok((settings, path)) => {
            if let Some(path) = path {
                log::trace!("Configuration loaded from {}", path.display());
            }
            settings
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = args.apply_to(&mut settings) {
        eprintln!("Error: {}", e);
        return 1;
    }

    let color = use_color(settings.color);
    colored::control::set_override(color);
    let log_file = settings.log_file.as_ref().map(|p| p.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        settings.log_level.as_deref(),
        settings.log_format.as_deref(),
        log_file.as_deref(),
        color,
    ) {
        eprintln!("Error initialising logging: {}", e);
        return 1;
    }

    log::info!(
        "fieldscan {} starting",
        crate::core::version::long_version()
    );

    match run(&args, &settings, color).await {
        Ok(()) => 0,
        Err(e) => {
            log::error!("FATAL: {}", e);
            1
        }
    }
}

fn fatal<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: E,
    context: &str,
) -> Box<dyn std::error::Error> {
    log_error_with_context(&error, context);
    Box::new(StartupFailed(context.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("{0} failed")]
struct StartupFailed(String);

async fn run(args: &Args, settings: &Settings, color: bool) -> Result<(), Box<dyn std::error::Error>> {
    let profile = build_profile(&args.command, settings)
        .map_err(|e| fatal(e, "Building the scan profile"))?;
    let session_args = args.command.session_args();
    let session_id = SessionId::new(session_args.session.clone());

    let expected = match &args.command {
        Command::Validate(validate) => read_expected(validate).await?,
        _ => Vec::new(),
    };

    let ledger: Arc<dyn LedgerClient> = if args.offline_ledger {
        log::warn!("Using an in-memory ledger; nothing is sent to the service");
        let memory = MemoryLedger::new();
        let normalizer = Normalizer::new(profile.normalizer.clone());
        if expected.is_empty() {
            memory.open_list(&session_id);
        } else {
            memory.open_validation(
                &session_id,
                expected.iter().map(|raw| normalizer.normalize(raw).canonical_id),
            );
        }
        Arc::new(memory)
    } else {
        http_ledger(settings, &profile).await?
    };

    let session = ScanSession::builder(session_id, profile, ledger)
        .delay(settings.scan.delay)
        .expected(expected)
        .build()
        .map_err(|e| fatal(e, "Starting the session"))?;
    let runner = SessionRunner::new(Arc::new(session), color);

    let (coordinator, _shutdown_rx) = ShutdownCoordinator::with_signal_handlers();
    match &session_args.replay {
        Some(path) => {
            runner.replay(path, settings.scan.delay, &coordinator).await?;
        }
        None => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            runner.interactive(stdin, &coordinator).await?;
        }
    }
    Ok(())
}

/// Profile for the subcommand with `[scan]` overrides applied
fn build_profile(command: &Command, settings: &Settings) -> crate::session::error::SessionResult<ScanProfile> {
    let mut profile = match command {
        Command::Scan(_) => ScanProfile::scooter()?,
        Command::Battery(_) => ScanProfile::battery(),
        Command::Validate(_) => ScanProfile::validate(),
    };

    let scan = &settings.scan;
    if let Some(prefixes) = &scan.prefixes {
        profile.normalizer.recognized_prefixes = prefixes.clone();
    }
    if let Some(pattern) = &scan.id_pattern {
        profile.normalizer.id_pattern = Some(pattern.clone());
    }
    if let Some(accept) = scan.accept_bare_ids {
        profile.normalizer.accept_bare_ids = accept;
    }
    Ok(profile)
}

async fn read_expected(args: &ValidateArgs) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut expected = args.expected.clone();
    if let Some(path) = &args.expected_file {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            fatal(
                ConfigError::Invalid {
                    message: format!("Cannot read {}: {}", path.display(), e),
                },
                "Reading the expected list",
            )
        })?;
        expected.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    if expected.is_empty() {
        return Err(fatal(
            ConfigError::Invalid {
                message: "validate needs --expected or --expected-file".to_string(),
            },
            "Reading the expected list",
        ));
    }
    Ok(expected)
}

/// HTTP ledger behind the offline cache controller
async fn http_ledger(
    settings: &Settings,
    profile: &ScanProfile,
) -> Result<Arc<dyn LedgerClient>, Box<dyn std::error::Error>> {
    let base_url = settings.ledger.base_url.clone().ok_or_else(|| {
        fatal(
            ConfigError::Invalid {
                message: "No ledger URL; set [ledger] base-url, pass --ledger-url or use --offline-ledger"
                    .to_string(),
            },
            "Connecting to the ledger",
        )
    })?;

    let network = HttpNetwork::new(settings.ledger.timeout)?;
    let mut cache = settings.cache.clone();
    for path in settings.ledger.paths.all() {
        cache.policy = cache.policy.with_dynamic_route(path);
    }

    let controller = OfflineCacheController::new(
        cache,
        Some(&base_url),
        Arc::new(CacheStorage::new()),
        Arc::new(network),
    )
    .map_err(|e| fatal(e, "Configuring the offline cache"))?;

    // Serving without a seeded cache still works, only without offline fallback
    match controller.start().await {
        Ok(purged) => log::debug!(
            "Offline cache {} ready ({} old generations purged)",
            controller.version(),
            purged.len()
        ),
        Err(e) => log::warn!("Offline cache not installed: {}", e),
    }

    let network: Arc<dyn Network> = Arc::new(controller);
    Ok(Arc::new(
        HttpLedgerClient::new(network, base_url, profile.asset).with_paths(settings.ledger.paths.clone()),
    ))
}
