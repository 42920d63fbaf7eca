//! Per-note lifecycle tracking.
//!
//! Advances every sounding note through attack, sustain and release, one
//! step per buffer tick, against the externally owned pressed-key set.

use std::collections::{HashMap, HashSet};

use crate::pitch::Note;

/// Envelope bookkeeping for one sounding note.
///
/// A note counts whole buffer ticks while held (clamped at the attack
/// window) and, once let go, whole ticks of release until it is dropped
/// from the active set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteState {
    released: bool,
    ticks_pressed: u32,
    ticks_released: u32,
}

impl NoteState {
    fn new() -> Self {
        Self {
            released: false,
            ticks_pressed: 0,
            ticks_released: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn with(released: bool, ticks_pressed: u32, ticks_released: u32) -> Self {
        Self {
            released,
            ticks_pressed,
            ticks_released,
        }
    }

    /// Whether the key has been let go and the note is fading out
    pub fn released(&self) -> bool {
        self.released
    }

    /// Whole ticks spent held, clamped to the attack window
    pub fn ticks_pressed(&self) -> u32 {
        self.ticks_pressed
    }

    /// Whole ticks spent fading out since release
    pub fn ticks_released(&self) -> u32 {
        self.ticks_released
    }
}

/// The set of notes currently contributing to the output waveform.
///
/// Owned exclusively by the generator stage of the streaming pipeline;
/// `update` runs exactly once per buffer tick.
pub struct ActiveNotes {
    notes: HashMap<Note, NoteState>,
    attack_ticks: u32,
    release_ticks: u32,
}

impl ActiveNotes {
    /// Create an empty tracker with the given envelope windows (in ticks).
    pub fn new(attack_ticks: u32, release_ticks: u32) -> Self {
        Self {
            notes: HashMap::new(),
            attack_ticks,
            release_ticks,
        }
    }

    /// Advance the state machine one tick against the pressed-key snapshot.
    pub fn update(&mut self, pressed: &HashSet<Note>) {
        self.advance_pressed(pressed);
        self.advance_released(pressed);
    }

    /// Pass 1: every pressed key either starts a fresh attack (when absent
    /// or caught mid-release) or accumulates held time.
    fn advance_pressed(&mut self, pressed: &HashSet<Note>) {
        for note in pressed {
            match self.notes.get_mut(note) {
                Some(state) if !state.released => {
                    state.ticks_pressed = (state.ticks_pressed + 1).min(self.attack_ticks);
                }
                _ => {
                    self.notes.insert(note.clone(), NoteState::new());
                }
            }
        }
    }

    /// Pass 2: every active note whose key is no longer held fades out and
    /// is dropped once the release window is spent.
    fn advance_released(&mut self, pressed: &HashSet<Note>) {
        let release_ticks = self.release_ticks;
        self.notes.retain(|note, state| {
            if pressed.contains(note) {
                return true;
            }
            if state.released {
                state.ticks_released += 1;
            }
            state.released = true;
            state.ticks_released < release_ticks
        });
    }

    /// Number of notes currently sounding
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Whether no note is sounding
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Iterate over the sounding notes and their envelope state
    pub fn iter(&self) -> impl Iterator<Item = (&Note, &NoteState)> {
        self.notes.iter()
    }

    /// Look up the envelope state of a note
    pub fn get(&self, note: &Note) -> Option<&NoteState> {
        self.notes.get(note)
    }
}
