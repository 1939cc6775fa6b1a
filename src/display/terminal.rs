use std::io::{self, Stdout};
use std::time::Duration;

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tracing::info;

use crate::display::{Command, Scene, Surface};
use crate::errors::Result;
use crate::panels::{PanelView, Region, TextSize};

const KEY_HINTS: &str = " Enter: fullscreen  Esc: leave fullscreen  q: quit ";

pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalDisplay {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let size = terminal.size()?;
        info!("Terminal size: {}x{}", size.width, size.height);
        Ok(Self { terminal })
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

impl Surface for TerminalDisplay {
    fn present(&mut self, scene: &Scene) -> Result<()> {
        self.terminal.draw(|frame| draw_scene(frame, scene))?;
        Ok(())
    }

    fn poll_input(&mut self, timeout: Duration) -> Result<Option<Command>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            // Only handle key press events, not release or repeat
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                Ok(command_for_key(key.code, key.modifiers))
            }
            Event::Resize(_, _) => Ok(Some(Command::Redraw)),
            _ => Ok(None),
        }
    }
}

pub fn command_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    match code {
        KeyCode::Enter => Some(Command::ToggleFullscreen),
        KeyCode::Esc => Some(Command::EndFullscreen),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        _ => None,
    }
}

/// Lay the panels out like a mirror: clock top-left, weather top-right,
/// markets above news in the bottom-left. Windowed mode adds a border with key hints.
pub fn draw_scene(frame: &mut Frame, scene: &Scene) {
    let mut area = frame.area();
    let background = Style::default().fg(Color::White).bg(Color::Black);

    if !scene.fullscreen {
        let chrome = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" mirror_display ")
            .title_bottom(Line::from(KEY_HINTS).centered())
            .style(background);
        let inner = chrome.inner(area);
        frame.render_widget(chrome, area);
        area = inner;
    } else {
        frame.render_widget(Block::default().style(background), area);
    }

    let [top, bottom] = Layout::vertical([Constraint::Percentage(50); 2]).areas(area);
    let [top_left, top_right] = Layout::horizontal([Constraint::Percentage(50); 2]).areas(top);
    let [bottom_left, _] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(bottom);
    let [bottom_upper, bottom_lower] =
        Layout::vertical([Constraint::Percentage(50); 2]).areas(bottom_left);

    for view in scene.views {
        let target = match view.region {
            Region::TopLeft => top_left,
            Region::TopRight => top_right,
            Region::BottomUpper => bottom_upper,
            Region::BottomLower => bottom_lower,
        };
        draw_panel(frame, view, target);
    }
}

fn draw_panel(frame: &mut Frame, view: &PanelView, area: Rect) {
    let mut lines = Vec::with_capacity(view.lines.len() + 1);
    if view.show_title {
        lines.push(Line::from(Span::styled(view.title.clone(), style_for(TextSize::Medium))));
    }
    for line in &view.lines {
        let mut spans = Vec::new();
        if let Some(icon) = line.icon {
            spans.push(Span::raw(format!("{} ", icon.glyph())));
        }
        spans.push(Span::styled(line.text.clone(), style_for(line.size)));
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().padding(Padding::new(4, 4, 1, 0)))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn style_for(size: TextSize) -> Style {
    let style = Style::default().fg(Color::White);
    match size {
        TextSize::ExtraLarge => style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        TextSize::Large | TextSize::Medium => style.add_modifier(Modifier::BOLD),
        TextSize::Small => style,
    }
}
