use engine::{LoopConfig, Scene};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay;
use super::settings::{load_settings, SettingsError};

const USAGE: &str = "usage: puzzle_room [--headless]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunMode {
    Windowed,
    Headless,
}

pub(crate) struct AppWiring {
    pub(crate) mode: RunMode,
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("unknown argument `{0}` ({})", USAGE)]
    UnknownArgument(String),
}

pub(crate) fn build_app(
    args: impl IntoIterator<Item = String>,
) -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Puzzle Room Startup ===");

    let mode = parse_run_mode(args)?;
    let settings = load_settings()?;
    let config = LoopConfig {
        target_tps: settings.simulation.target_tps,
        max_headless_ticks: settings.simulation.max_headless_ticks,
        ..LoopConfig::default()
    };
    info!(
        ?mode,
        target_tps = config.target_tps,
        max_headless_ticks = config.max_headless_ticks,
        "app_configured"
    );

    Ok(AppWiring {
        mode,
        config,
        scene: gameplay::build_scene(settings),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_run_mode(args: impl IntoIterator<Item = String>) -> Result<RunMode, BootstrapError> {
    let mut mode = RunMode::Windowed;
    for arg in args {
        match arg.as_str() {
            "--headless" => mode = RunMode::Headless,
            _ => return Err(BootstrapError::UnknownArgument(arg)),
        }
    }
    Ok(mode)
}
