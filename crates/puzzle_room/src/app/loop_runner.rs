use std::process::ExitCode;

use engine::{run_app, run_headless, HeadlessStop, SceneWorld};
use tracing::{error, info, warn};

use super::bootstrap::{AppWiring, RunMode};
use super::gameplay::{DemoProgress, DemoScript};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        mode,
        config,
        scene,
    } = app;

    match mode {
        RunMode::Windowed => {
            if let Err(err) = run_app(config, scene) {
                error!(error = %err, "startup_failed");
                return ExitCode::FAILURE;
            }
        }
        RunMode::Headless => {
            let mut script = DemoScript::default();
            let mut progress = DemoProgress::default();
            let inspect = |_, world: &SceneWorld| progress.observe(world);
            let report = match run_headless(&config, scene, &mut script, inspect) {
                Ok(report) => report,
                Err(err) => {
                    error!(error = %err, "startup_failed");
                    return ExitCode::FAILURE;
                }
            };
            if report.stopped_by == HeadlessStop::TickLimit {
                warn!(ticks_run = report.ticks_run, "headless_tick_limit_reached");
                return ExitCode::FAILURE;
            }
            info!(
                ticks_run = report.ticks_run,
                door_open = progress.door_open,
                player_past_door = progress.player_past_door,
                "headless_demo_complete"
            );
            if !progress.door_open {
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
