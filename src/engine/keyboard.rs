//! Shared state of the keys currently held down.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use crate::pitch::Note;

/// The set of notes currently held, plus the transposable base octave.
///
/// Mutated by the input layer; the generator stage only ever takes
/// snapshots, so a key changing mid-tick is simply picked up on the next
/// tick.
pub struct Keyboard {
    pressed: Mutex<HashSet<Note>>,
    octave: AtomicI32,
}

impl Keyboard {
    /// Create a keyboard with no keys held
    pub fn new(base_octave: i32) -> Self {
        Self {
            pressed: Mutex::new(HashSet::new()),
            octave: AtomicI32::new(base_octave),
        }
    }

    /// Mark a note as held
    pub fn press(&self, note: Note) {
        self.pressed.lock().unwrap().insert(note);
    }

    /// Mark a note as no longer held
    pub fn release(&self, note: &Note) {
        self.pressed.lock().unwrap().remove(note);
    }

    /// Release every held note
    pub fn release_all(&self) {
        self.pressed.lock().unwrap().clear();
    }

    /// Snapshot of the currently held notes
    pub fn pressed(&self) -> HashSet<Note> {
        self.pressed.lock().unwrap().clone()
    }

    /// Whether any key is held
    pub fn any_pressed(&self) -> bool {
        !self.pressed.lock().unwrap().is_empty()
    }

    /// Current base octave
    pub fn octave(&self) -> i32 {
        self.octave.load(Ordering::SeqCst)
    }

    /// Transpose one octave up
    pub fn octave_up(&self) {
        self.octave.fetch_add(1, Ordering::SeqCst);
    }

    /// Transpose one octave down
    pub fn octave_down(&self) {
        self.octave.fetch_sub(1, Ordering::SeqCst);
    }
}
