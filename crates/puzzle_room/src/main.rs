mod app;

use std::process::ExitCode;

fn main() -> ExitCode {
    match app::bootstrap::build_app(std::env::args().skip(1)) {
        Ok(app) => app::loop_runner::run(app),
        Err(err) => {
            tracing::error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
