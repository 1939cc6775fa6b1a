use crate::display::Command;

/// The root window: owns the fullscreen state the key bindings toggle.
#[derive(Debug, Clone)]
pub struct RootWindow {
    fullscreen: bool,
}

impl RootWindow {
    pub fn new(fullscreen: bool) -> Self {
        Self { fullscreen }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
    }

    pub fn end_fullscreen(&mut self) {
        self.fullscreen = false;
    }

    /// Apply a window command. Returns whether the surface needs redrawing.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::ToggleFullscreen => {
                self.toggle_fullscreen();
                true
            }
            Command::EndFullscreen => {
                let was_fullscreen = self.fullscreen;
                self.end_fullscreen();
                was_fullscreen
            }
            Command::Redraw => true,
            Command::Quit => false,
        }
    }
}
