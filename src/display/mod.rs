use std::time::Duration;

use crate::errors::Result;
use crate::panels::PanelView;

pub mod oled;
pub mod tca9548a;
pub mod terminal;

pub use oled::OledDisplay;
pub use terminal::TerminalDisplay;

/// Input the root window reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleFullscreen,
    EndFullscreen,
    Redraw,
    Quit,
}

/// Everything a surface needs to draw one frame.
pub struct Scene<'a> {
    pub views: &'a [PanelView],
    pub fullscreen: bool,
}

// Output device the root window draws on
pub trait Surface {
    fn present(&mut self, scene: &Scene) -> Result<()>;

    /// Wait up to `timeout` for input. `None` means the timeout passed quietly.
    fn poll_input(&mut self, timeout: Duration) -> Result<Option<Command>>;
}
