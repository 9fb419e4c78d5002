use std::process::ExitCode;

mod app;
mod logging;

fn main() -> ExitCode {
    let args = media_tidy::cli::parse();
    match app::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        // app::run has already reported the failure.
        Err(e) => ExitCode::from(app::exit_status(&e)),
    }
}
