use std::env;
use std::time::{Duration, Instant};

use chrono::Local;
use daemonize::Daemonize;
use tracing::{info, warn};

use crate::cli::CliParser;
use crate::config::{AppConfig, OutputKind};
use crate::display::{Command, OledDisplay, Scene, Surface, TerminalDisplay};
use crate::errors::{AppError, Result};
use crate::icons;
use crate::logging;
use crate::panel_factory::PanelFactory;
use crate::scheduler::Scheduler;
use crate::sources::http;
use crate::window::RootWindow;

const PID_FILE: &str = "/tmp/mirror_display.pid";
/// Poll timeout when no panel is scheduled.
const IDLE_POLL: Duration = Duration::from_secs(1);

pub struct Application {
    config: AppConfig,
    scheduler: Scheduler,
    window: RootWindow,
    surface: Option<Box<dyn Surface>>,
}

impl Application {
    pub fn new() -> Result<Self> {
        let config = CliParser::parse()?;
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: AppConfig) -> Self {
        let window = RootWindow::new(config.start_fullscreen);
        Self {
            config,
            scheduler: Scheduler::new(),
            window,
            surface: None,
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        logging::init(&self.config)?;
        info!("mirror_display v{} starting", env!("CARGO_PKG_VERSION"));

        // Handle clear-only mode
        if self.config.clear_only {
            OledDisplay::clear_display(&self.config.multiplexer)?;
            info!("Display cleared");
            return Ok(());
        }

        if self.config.daemon_mode {
            self.start_daemon()?;
        }

        self.check_environment();

        let client = http::build_client(Duration::from_secs(self.config.http_timeout_secs))
            .map_err(|e| AppError::Panel(format!("Failed to build HTTP client: {}", e)))?;

        let surface: Box<dyn Surface> = match self.config.output {
            OutputKind::Terminal => Box::new(TerminalDisplay::new()?),
            OutputKind::Oled => Box::new(OledDisplay::new(&self.config)?),
        };
        self.surface = Some(surface);

        for (panel, interval) in PanelFactory::create_panels(&self.config, &client)? {
            info!(panel = panel.name(), ?interval, "registering panel");
            self.scheduler.register(panel, interval, Instant::now(), &Local::now());
        }
        info!("{} panels registered", self.scheduler.len());

        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        if self.config.clear_only {
            return Ok(());
        }

        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| AppError::display("Display not initialized"))?;

        Application::run_display_loop(&mut self.scheduler, &mut self.window, surface.as_mut())
    }

    fn start_daemon(&self) -> Result<()> {
        // Stay in the launch directory so relative asset and log paths keep working
        let working_directory = env::current_dir()?;
        let daemonize = Daemonize::new()
            .pid_file(PID_FILE)
            .chown_pid_file(true)
            .working_directory(working_directory);

        daemonize
            .start()
            .map_err(|e| AppError::daemon(&format!("Failed to start daemon: {}", e)))?;

        info!("Running as daemon, pid file {}", PID_FILE);
        Ok(())
    }

    fn check_environment(&self) {
        let panels = self.config.panels_as_str_refs();
        if panels.contains(&"weather") && self.config.weather_api_token.is_empty() {
            warn!("No OpenWeatherMap API token configured, weather requests will be rejected");
        }

        let missing = icons::missing_assets(&self.config.assets_dir);
        if !missing.is_empty() {
            warn!(
                assets_dir = %self.config.assets_dir.display(),
                missing = missing.len(),
                "icon assets not found"
            );
        }
    }

    /// Drive the dashboard until the surface reports `Quit`: run due panels,
    /// redraw when something changed, then wait for input until the next deadline.
    pub fn run_display_loop(
        scheduler: &mut Scheduler,
        window: &mut RootWindow,
        surface: &mut dyn Surface,
    ) -> Result<()> {
        let mut redraw = true;
        loop {
            scheduler.run_due(Instant::now(), &Local::now());

            if scheduler.take_dirty() || redraw {
                let views = scheduler.views();
                surface.present(&Scene {
                    views: &views,
                    fullscreen: window.is_fullscreen(),
                })?;
                redraw = false;
            }

            let timeout = scheduler
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_POLL);

            match surface.poll_input(timeout)? {
                Some(Command::Quit) => {
                    info!("Quit requested, shutting down");
                    return Ok(());
                }
                Some(command) => redraw |= window.handle(command),
                None => {}
            }
        }
    }

    #[allow(dead_code)]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::testing::{FakeFeed, Scripted};
    use crate::panels::HeadlinesPanel;
    use std::collections::VecDeque;

    /// Replays queued input and records what each frame looked like.
    struct FakeSurface {
        input: VecDeque<Option<Command>>,
        frames: Vec<(bool, Vec<String>)>,
    }

    impl FakeSurface {
        fn new(input: Vec<Option<Command>>) -> Self {
            Self {
                input: input.into(),
                frames: Vec::new(),
            }
        }
    }

    impl Surface for FakeSurface {
        fn present(&mut self, scene: &Scene) -> Result<()> {
            let names = scene.views.iter().map(|v| v.name.to_string()).collect();
            self.frames.push((scene.fullscreen, names));
            Ok(())
        }

        fn poll_input(&mut self, _timeout: Duration) -> Result<Option<Command>> {
            Ok(self.input.pop_front().unwrap_or(Some(Command::Quit)))
        }
    }

    fn scheduler_with_news() -> Scheduler {
        let mut scheduler = Scheduler::new();
        let feed = FakeFeed(Scripted::new(vec![Ok(vec!["Headline".to_string()])]));
        scheduler.register(
            Box::new(HeadlinesPanel::news(Box::new(feed))),
            Duration::from_secs(600),
            Instant::now(),
            &Local::now(),
        );
        scheduler
    }

    #[test]
    fn test_loop_redraws_on_window_commands() {
        let mut scheduler = scheduler_with_news();
        let mut window = RootWindow::new(false);
        let mut surface = FakeSurface::new(vec![
            None,
            Some(Command::ToggleFullscreen),
            Some(Command::EndFullscreen),
            Some(Command::EndFullscreen),
        ]);

        Application::run_display_loop(&mut scheduler, &mut window, &mut surface).unwrap();

        let fullscreen: Vec<bool> = surface.frames.iter().map(|(f, _)| *f).collect();
        assert_eq!(fullscreen, vec![false, true, false]);
        assert_eq!(surface.frames[0].1, vec!["news"]);
    }

    #[test]
    fn test_loop_quits_immediately() {
        let mut scheduler = scheduler_with_news();
        let mut window = RootWindow::new(true);
        let mut surface = FakeSurface::new(vec![Some(Command::Quit)]);

        Application::run_display_loop(&mut scheduler, &mut window, &mut surface).unwrap();
        assert_eq!(surface.frames.len(), 1);
        assert!(surface.frames[0].0);
    }

    #[test]
    fn test_with_config_uses_fullscreen_setting() {
        let config = AppConfig {
            start_fullscreen: true,
            ..AppConfig::default()
        };
        let app = Application::with_config(config);
        assert!(app.window.is_fullscreen());
        assert!(app.scheduler.is_empty());
        assert_eq!(app.config().panels.len(), 4);
    }

    #[test]
    fn test_run_without_surface_fails() {
        let mut app = Application::with_config(AppConfig::default());
        assert!(matches!(app.run(), Err(AppError::Display(_))));
    }
}
