mod app;
mod cli;
mod config;
mod display;
mod errors;
mod icons;
mod locale;
mod logging;
mod panel_factory;
mod panels;
mod scheduler;
mod sources;
mod state;
mod window;

use std::process::ExitCode;

use app::Application;
use errors::Result;

fn run() -> Result<()> {
    let mut app = Application::new()?;
    app.initialize()?;
    app.run()
}

fn main() -> ExitCode {
    // The application, and with it the terminal, is torn down before the error is printed
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
