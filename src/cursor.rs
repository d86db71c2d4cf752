//! Per-panel cursor state.

use crate::coords::AppCol;

/// Channel rack cursor: a channel row and a zoned column
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelRackCursor {
    /// Channel index (row)
    pub channel: usize,
    /// Column in app space (mute / name / steps)
    pub col: AppCol,
    /// First visible row
    pub viewport_top: usize,
}

/// Piano roll cursor: a MIDI pitch and a step
#[derive(Debug, Clone, Copy)]
pub struct PianoRollCursor {
    pub pitch: u8,
    pub step: usize,
    /// Highest visible pitch
    pub viewport_top: u8,
}

impl Default for PianoRollCursor {
    fn default() -> Self {
        Self {
            pitch: 60, // middle C
            step: 0,
            viewport_top: 72,
        }
    }
}

/// Playlist cursor: a pattern row and a bar column
/// (col 0 is the pattern-mute column, bars are cols 1-16)
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaylistCursor {
    pub row: usize,
    pub col: usize,
    pub viewport_top: usize,
}

impl PlaylistCursor {
    /// Bar under the cursor, if the cursor is on the bar zone
    pub fn bar(&self) -> Option<usize> {
        self.col.checked_sub(1).filter(|b| *b < 16)
    }
}

/// All panel cursors
#[derive(Debug, Clone, Copy, Default)]
pub struct Cursors {
    pub channel_rack: ChannelRackCursor,
    pub piano_roll: PianoRollCursor,
    pub playlist: PlaylistCursor,
}
