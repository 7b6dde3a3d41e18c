//! Terminal interface for playing the synth
//!
//! Provides a TUI showing:
//! - The keyboard diagram with the sounding key highlighted
//! - A scope of the most recent output
//! - Note, frequency and envelope status
//!
//! The draw loop doubles as the control-rate loop: every pass polls the
//! terminal for key events and ticks the session.

mod keyboard;
mod scope;

pub use keyboard::{KeyboardDiagram, DIAGRAM_SIZE};
pub use scope::Scope;

use std::io::Stdout;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::engine::{note_name, Session, Status};

/// How often the control loop polls input
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How often the screen is redrawn
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Buffer for storing recent audio samples for visualization
pub struct SampleBuffer {
    samples: Vec<f32>,
    capacity: usize,
    write_pos: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            capacity,
            write_pos: 0,
        }
    }

    /// Push a new sample into the buffer
    pub fn push(&mut self, sample: f32) {
        self.samples[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.capacity;
    }

    /// Get all samples in order (oldest to newest)
    pub fn get_samples(&self) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.capacity);
        result.extend_from_slice(&self.samples[self.write_pos..]);
        result.extend_from_slice(&self.samples[..self.write_pos]);
        result
    }

    /// Get the most recent N samples
    pub fn get_recent(&self, count: usize) -> Vec<f32> {
        let count = count.min(self.capacity);
        let samples = self.get_samples();
        samples[self.capacity - count..].to_vec()
    }
}

/// What a key event means to the control loop
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Quit,
    Panic,
    Press(char),
    Release(char),
    Ignore,
}

fn classify(key: KeyEvent) -> Action {
    match (key.code, key.modifiers, key.kind) {
        (KeyCode::Esc, _, KeyEventKind::Press) => Action::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL, _) => Action::Quit,
        (KeyCode::Char(' '), _, KeyEventKind::Press) => Action::Panic,
        (KeyCode::Char(c), _, KeyEventKind::Release) => Action::Release(c),
        (KeyCode::Char(c), _, _) => Action::Press(c),
        _ => Action::Ignore,
    }
}

struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    enhanced: bool,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Without this most terminals never report key releases
        let enhanced = supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        log::debug!("keyboard release events: {}", enhanced);

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal, enhanced })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
    }
}

/// Run the interactive TUI until the user quits
pub fn run_tui(session: &mut Session, samples: Arc<Mutex<SampleBuffer>>) -> Result<()> {
    let mut guard = TerminalGuard::enter()?;
    let release_events = guard.enhanced;
    let mut last_frame: Option<Instant> = None;

    loop {
        let now = Instant::now();
        if last_frame.map_or(true, |t| now.duration_since(t) >= FRAME_INTERVAL) {
            let status = session.status();
            let midi_port = session.midi_port().map(str::to_string);
            guard.terminal.draw(|f| {
                draw_ui(f, &status, &samples, midi_port.as_deref(), release_events);
            })?;
            last_frame = Some(now);
        }

        while event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                match classify(key) {
                    Action::Quit => return Ok(()),
                    Action::Panic => session.all_notes_off(),
                    Action::Press(c) => {
                        session.key_press(c, Instant::now());
                    }
                    Action::Release(c) => session.key_release(c),
                    Action::Ignore => {}
                }
            }
        }

        session.tick(Instant::now());
    }
}

fn draw_ui(
    f: &mut Frame,
    status: &Status,
    samples: &Mutex<SampleBuffer>,
    midi_port: Option<&str>,
    release_events: bool,
) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(DIAGRAM_SIZE.1 + 2), // Keyboard
            Constraint::Min(5),                     // Scope
            Constraint::Length(3),                  // Status
        ])
        .split(area);

    let keyboard = KeyboardDiagram::new(status.note)
        .style(Style::default().fg(Color::Gray))
        .highlight(Style::default().fg(Color::Black).bg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Keyboard "));
    f.render_widget(keyboard, chunks[0]);

    draw_scope(f, chunks[1], samples);
    draw_status(f, chunks[2], status, midi_port, release_events);
}

fn draw_scope(f: &mut Frame, area: Rect, samples: &Mutex<SampleBuffer>) {
    let recent = match samples.lock() {
        Ok(buffer) => buffer.get_recent(area.width as usize),
        Err(_) => Vec::new(),
    };

    let scope = Scope::new(&recent)
        .gain(1.5)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Scope "));

    f.render_widget(scope, area);
}

fn status_line(status: &Status) -> String {
    match status.note {
        Some(note) => format!(
            "{:<2} {:>8.2} Hz  {:<7} {:.2}",
            note_name(note),
            status.frequency,
            status.phase.name(),
            status.amplitude
        ),
        None => format!("--  {:>8} Hz  {:<7} {:.2}", "-", status.phase.name(), status.amplitude),
    }
}

fn draw_status(f: &mut Frame, area: Rect, status: &Status, midi_port: Option<&str>, release_events: bool) {
    let note_color = if status.amplitude > 0.0 { Color::Green } else { Color::DarkGray };

    let mut spans = vec![
        Span::raw("  "),
        Span::styled(status_line(status), Style::default().fg(note_color).add_modifier(Modifier::BOLD)),
        Span::raw("  |  "),
        Span::raw(format!("{:.1}s", status.time)),
    ];
    if let Some(port) = midi_port {
        spans.push(Span::raw(format!("  |  MIDI: {}", port)));
    }
    if !release_events {
        spans.push(Span::styled("  |  hold via key repeat", Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::raw("  |  Space: all off  Esc: quit"));

    let paragraph = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));

    f.render_widget(paragraph, area);
}
