//! Terminal interface for live playing
//!
//! Captures key press/release events in raw mode, maps two keyboard rows
//! onto pitches, and shows:
//! - the synthesized waveform
//! - currently held notes and the base octave
//! - key hints

mod waveform;

pub use waveform::Waveform;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::engine::Keyboard;
use crate::pitch::Note;

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

    /// Get the most recent `count` samples, oldest first
    pub fn recent(&self, count: usize) -> Vec<f32> {
        let count = count.min(self.capacity);
        let mut result = Vec::with_capacity(count);
        for i in 0..count {
            let idx = (self.write_pos + self.capacity - count + i) % self.capacity;
            result.push(self.samples[idx]);
        }
        result
    }
}

/// Two-row piano mapping: home row for the white keys, the row above for
/// the black keys, continuing into a second octave.
fn key_map() -> Result<HashMap<KeyCode, Note>> {
    let bindings = [
        ('a', "C", 0),
        ('w', "C#", 0),
        ('s', "D", 0),
        ('e', "D#", 0),
        ('d', "E", 0),
        ('f', "F", 0),
        ('t', "F#", 0),
        ('g', "G", 0),
        ('y', "G#", 0),
        ('h', "A", 0),
        ('u', "A#", 0),
        ('j', "B", 0),
        ('k', "C", 1),
        ('o', "C#", 1),
        ('l', "D", 1),
        ('p', "D#", 1),
        (';', "E", 1),
        ('\'', "F", 1),
        (']', "F#", 1),
        ('\\', "G#", 1),
    ];

    let mut map = HashMap::new();
    for (key, name, octave) in bindings {
        map.insert(KeyCode::Char(key), Note::new(name, octave)?);
    }
    map.insert(KeyCode::Enter, Note::new("G", 1)?);
    Ok(map)
}

/// Run the interactive keyboard UI until the user quits.
///
/// Drives the shared `Keyboard` that the streaming pipeline reads from.
/// Terminals without keyboard-enhancement support never report key
/// releases; there the space bar is the way to silence held notes.
pub fn run(keyboard: &Arc<Keyboard>, samples: &Arc<Mutex<SampleBuffer>>) -> Result<()> {
    let key_map = key_map()?;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        terminal.draw(|f| draw_ui(f, keyboard, samples, release_events))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Press => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            break;
                        }
                        KeyCode::Char('z') => keyboard.octave_down(),
                        KeyCode::Char('x') => keyboard.octave_up(),
                        KeyCode::Char(' ') => keyboard.release_all(),
                        code => {
                            if let Some(note) = key_map.get(&code) {
                                keyboard.press(note.clone());
                            }
                        }
                    },
                    KeyEventKind::Release => {
                        if let Some(note) = key_map.get(&key.code) {
                            keyboard.release(note);
                        }
                    }
                    KeyEventKind::Repeat => {}
                }
            }
        }
    }

    keyboard.release_all();

    if release_events {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}

fn draw_ui(
    f: &mut Frame,
    keyboard: &Keyboard,
    samples: &Arc<Mutex<SampleBuffer>>,
    release_events: bool,
) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Waveform
            Constraint::Length(4), // Status
        ])
        .split(area);

    draw_waveform(f, chunks[0], samples);
    draw_status(f, chunks[1], keyboard, release_events);
}

fn draw_waveform(f: &mut Frame, area: Rect, samples: &Arc<Mutex<SampleBuffer>>) {
    let recent = match samples.lock() {
        Ok(buffer) => buffer.recent(area.width as usize * 2),
        Err(_) => Vec::new(),
    };

    let waveform = Waveform::new(&recent)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Waveform "));

    f.render_widget(waveform, area);
}

fn draw_status(f: &mut Frame, area: Rect, keyboard: &Keyboard, release_events: bool) {
    let mut names: Vec<String> = keyboard.pressed().iter().map(Note::to_string).collect();
    names.sort();

    let notes_line = Line::from(vec![
        Span::raw("  Notes: ["),
        Span::styled(names.join("  "), Style::default().fg(Color::Green)),
        Span::raw(format!("]   Octave: {}", keyboard.octave())),
    ]);

    let mut hints = String::from("  z/x: octave down/up  |  space: silence  |  q: quit");
    if !release_events {
        hints.push_str("  (no key-release events; use space)");
    }

    let paragraph = Paragraph::new(vec![notes_line, Line::from(hints)])
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(paragraph, area);
}
