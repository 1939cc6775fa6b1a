use std::thread;
use std::time::{Duration, Instant};

use embedded_graphics::{
    mono_font::{
        iso_8859_1::{FONT_6X10, FONT_7X13_BOLD},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::Text,
};
use linux_embedded_hal::I2cdev;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};
use tracing::{debug, info};

use crate::config::{AppConfig, MultiplexerConfig};
use crate::display::tca9548a::Tca9548a;
use crate::display::{Command, Scene, Surface};
use crate::errors::{DisplayErrorExt, Result};
use crate::panels::PanelView;

const I2C_BUS: &str = "/dev/i2c-1";
/// Characters of FONT_6X10 that fit across 128 pixels.
const LINE_WIDTH: usize = 21;
const DISPLAY_HEIGHT: i32 = 64;

type Driver = Ssd1306<I2CInterface<I2cdev>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Cycles through panels, one at a time, every `duration`.
#[derive(Debug)]
pub struct Rotation {
    index: usize,
    last_switch: Instant,
    duration: Duration,
}

impl Rotation {
    pub fn new(duration: Duration, now: Instant) -> Self {
        Self {
            index: 0,
            last_switch: now,
            duration,
        }
    }

    pub fn should_switch(&self, count: usize, now: Instant) -> bool {
        count > 1 && now.duration_since(self.last_switch) >= self.duration
    }

    pub fn next(&mut self, count: usize, now: Instant) {
        if count > 1 {
            self.index = (self.index + 1) % count;
            self.last_switch = now;
        }
    }

    pub fn current(&self, count: usize) -> usize {
        if count == 0 { 0 } else { self.index % count }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(now.duration_since(self.last_switch))
    }
}

/// Shorten `text` to `max` characters, ending in "..." when cut.
pub fn fit_line(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut fitted: String = text.chars().take(keep).collect();
    fitted.push_str("...");
    fitted
}

pub struct OledDisplay {
    display: Driver,
    _mux: Option<Tca9548a>,
    rotation: Rotation,
    view_count: usize,
}

impl OledDisplay {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mux = select_mux_channel(&config.multiplexer)?;
        let context = if mux.is_some() {
            format!(
                "Failed to initialize display on multiplexer channel {}",
                config.multiplexer.channel
            )
        } else {
            "Failed to initialize display on I2C bus. Check if display is connected or use --mux flag if using multiplexer".to_string()
        };
        let display = open_display(&context)?;

        Ok(Self {
            display,
            _mux: mux,
            rotation: Rotation::new(Duration::from_secs(config.screen_duration_secs), Instant::now()),
            view_count: 0,
        })
    }

    /// Blank the display and exit, used by `--clear`.
    pub fn clear_display(multiplexer: &MultiplexerConfig) -> Result<()> {
        let mux = select_mux_channel(multiplexer)?;
        let mut display = open_display("Failed to initialize display for clearing")?;
        display.clear(BinaryColor::Off).display_err("Failed to clear display")?;
        display.flush().display_err("Failed to flush display")?;
        if let Some(mut mux) = mux {
            mux.disable_all_channels()?;
        }
        Ok(())
    }

    pub fn render_content(&mut self, title: &str, lines: &[String]) -> Result<()> {
        self.display.clear(BinaryColor::Off).display_err("Failed to clear display")?;

        let title_style = MonoTextStyle::new(&FONT_7X13_BOLD, BinaryColor::On);
        Text::new(&fit_line(title, 18), Point::new(0, 12), title_style)
            .draw(&mut self.display)
            .display_err("Failed to draw title")?;

        let content_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        for (i, line) in lines.iter().enumerate() {
            let y_pos = 25 + (i as i32 * 12);
            if y_pos >= DISPLAY_HEIGHT {
                break;
            }
            Text::new(&fit_line(line, LINE_WIDTH), Point::new(0, y_pos), content_style)
                .draw(&mut self.display)
                .display_err("Failed to draw line")?;
        }

        self.display.flush().display_err("Failed to flush display")?;
        Ok(())
    }

    fn render_view(&mut self, view: &PanelView) -> Result<()> {
        let lines: Vec<String> = view.lines.iter().map(|line| line.text.clone()).collect();
        if lines.is_empty() {
            return self.render_content(&view.title, &["Waiting for data...".to_string()]);
        }
        self.render_content(&view.title, &lines)
    }
}

impl Surface for OledDisplay {
    // A 128x64 panel has no room for the full layout, so fullscreen is ignored
    fn present(&mut self, scene: &Scene) -> Result<()> {
        self.view_count = scene.views.len();
        match scene.views.get(self.rotation.current(self.view_count)) {
            Some(view) => {
                debug!(panel = view.name, "drawing panel on OLED");
                self.render_view(view)
            }
            None => self.render_content("No Panel", &["No panels enabled".to_string()]),
        }
    }

    fn poll_input(&mut self, timeout: Duration) -> Result<Option<Command>> {
        let rotating = self.view_count > 1;
        let wait = if rotating {
            timeout.min(self.rotation.remaining(Instant::now()))
        } else {
            timeout
        };
        thread::sleep(wait);

        let now = Instant::now();
        if self.rotation.should_switch(self.view_count, now) {
            self.rotation.next(self.view_count, now);
            return Ok(Some(Command::Redraw));
        }
        Ok(None)
    }
}

fn select_mux_channel(multiplexer: &MultiplexerConfig) -> Result<Option<Tca9548a>> {
    if !multiplexer.enabled {
        return Ok(None);
    }
    info!(
        "Using TCA9548A multiplexer on address 0x{:02X}, channel {}",
        multiplexer.address, multiplexer.channel
    );
    let i2c = I2cdev::new(I2C_BUS).display_err("Failed to open I2C bus for multiplexer")?;
    let mut mux = Tca9548a::new(i2c, multiplexer.address);
    mux.select_channel(multiplexer.channel)?;
    debug!(channel = ?mux.current_channel(), "multiplexer channel selected");
    Ok(Some(mux))
}

// The multiplexer keeps its channel selected, so the display gets its own bus handle
fn open_display(context: &str) -> Result<Driver> {
    let i2c = I2cdev::new(I2C_BUS).display_err("Failed to open I2C bus")?;
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    display.init().display_err(context)?;
    Ok(display)
}
