//! Cross-view jump list for Ctrl+O/Ctrl+I navigation.
//!
//! One jumplist serves the whole app: it tracks positions across the channel
//! rack, piano roll and playlist, so jumping back can switch views.

use crate::mode::ViewMode;

/// Maximum number of positions to keep
const MAX_JUMPLIST_SIZE: usize = 100;

/// A position in the app that can be jumped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpPosition {
    /// Which view this position is in
    pub view: ViewMode,
    /// Row coordinate (channel / pitch-row / pattern-row depending on view)
    pub row: usize,
    /// Column coordinate (step / step / bar depending on view)
    pub col: usize,
}

impl JumpPosition {
    pub fn new(view: ViewMode, row: usize, col: usize) -> Self {
        Self { view, row, col }
    }

    pub fn channel_rack(channel: usize, step: usize) -> Self {
        Self::new(ViewMode::ChannelRack, channel, step)
    }

    pub fn piano_roll(pitch_row: usize, step: usize) -> Self {
        Self::new(ViewMode::PianoRoll, pitch_row, step)
    }

    pub fn playlist(pattern_row: usize, bar: usize) -> Self {
        Self::new(ViewMode::Playlist, pattern_row, bar)
    }
}

/// Bounded position history with a back/forward cursor.
///
/// - Jumps (view switches, gg, G) push the pre-jump position
/// - `back` walks toward the oldest entry, saving the current position on
///   the first step back so `forward` can return to it
/// - Pushing after going back truncates the forward history
#[derive(Debug, Default)]
pub struct Jumplist {
    /// Positions, oldest at index 0
    positions: Vec<JumpPosition>,
    /// Current index; -1 means "at the live position", past the end
    index: isize,
}

impl Jumplist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a jump from the given position
    pub fn push(&mut self, pos: JumpPosition) {
        // Skip duplicate adjacent entries
        if self.positions.last() == Some(&pos) {
            return;
        }

        // A new jump after navigating back truncates the forward history
        if self.index >= 0 {
            let keep = (self.index + 1) as usize;
            self.positions.truncate(keep);
        }

        self.positions.push(pos);
        self.index = -1;

        if self.positions.len() > MAX_JUMPLIST_SIZE {
            self.positions.remove(0);
        }
    }

    /// Go back (Ctrl+O). `current` is saved on the first step back so that
    /// forward can return to it. Returns None at the oldest entry.
    pub fn back(&mut self, current: JumpPosition) -> Option<JumpPosition> {
        if self.positions.is_empty() {
            return None;
        }

        if self.index == -1 {
            if self.positions.last() != Some(&current) {
                self.positions.push(current);
            }
            self.index = (self.positions.len() as isize) - 2;
        } else if self.index > 0 {
            self.index -= 1;
        } else {
            return None;
        }

        if self.index >= 0 {
            self.positions.get(self.index as usize).copied()
        } else {
            None
        }
    }

    /// Go forward (Ctrl+I). Returns None at the newest entry.
    pub fn forward(&mut self) -> Option<JumpPosition> {
        if self.index < 0 || self.positions.is_empty() {
            return None;
        }

        let max_index = (self.positions.len() as isize) - 1;
        if self.index < max_index {
            self.index += 1;
            let pos = self.positions.get(self.index as usize).copied();
            if self.index == max_index {
                // Back at the live position
                self.index = -1;
            }
            pos
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
