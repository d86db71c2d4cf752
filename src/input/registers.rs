//! Shared vim register file.
//!
//! One register file serves every grid. Payloads are typed per grid
//! (step cells, note offsets, placement offsets); pasting a payload into a
//! grid of a different type is a silent no-op at the paste site.
//!
//! Register law:
//! - Yank writes the unnamed register and register 0 (and any explicitly
//!   selected register, which clears the selection).
//! - Delete shifts registers 1-8 into 2-9 (dropping the old 9), writes the
//!   new content to register 1 and the unnamed register, and never touches
//!   register 0.

use crate::song::{YankedNote, YankedPlacement};

use super::vim::RangeKind;

/// Register names: the unnamed register `"` and numbered registers 0-9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterName {
    Unnamed,
    Numbered(u8),
}

impl RegisterName {
    /// Parse the key pressed after a `"` prefix
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '"' => Some(Self::Unnamed),
            '0'..='9' => Some(Self::Numbered(c as u8 - b'0')),
            _ => None,
        }
    }
}

/// Grid-specific register payload
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterData {
    /// Step cells from the channel rack: rows of booleans
    Steps(Vec<Vec<bool>>),
    /// Piano roll notes as offsets from the yank anchor
    Notes(Vec<YankedNote>),
    /// Playlist placements as offsets from the yank anchor
    Placements(Vec<YankedPlacement>),
}

/// Register content: a payload tagged with the range kind it came from
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterContent {
    pub data: RegisterData,
    pub kind: RangeKind,
}

impl RegisterContent {
    pub fn new(data: RegisterData, kind: RangeKind) -> Self {
        Self { data, kind }
    }
}

/// The process-wide register file.
///
/// Constructed once in `App::new` and threaded to the input handlers;
/// tests instantiate a fresh one per test.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    /// Unnamed register `"` (last operation)
    unnamed: Option<RegisterContent>,
    /// Register 0: last yank
    yank: Option<RegisterContent>,
    /// Registers 1-9: delete history (index 0 = register 1)
    deletes: [Option<RegisterContent>; 9],
    /// Explicitly selected register for the next yank/delete/paste
    selected: Option<RegisterName>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a register for the next operation (`"3y$` style)
    pub fn select(&mut self, name: RegisterName) {
        self.selected = Some(name);
    }

    pub fn selected(&self) -> Option<RegisterName> {
        self.selected
    }

    /// Store a yank: unnamed + register 0 + any selected register
    pub fn store_yank(&mut self, data: RegisterData, kind: RangeKind) {
        let content = RegisterContent::new(data, kind);
        self.yank = Some(content.clone());
        if let Some(name) = self.selected.take() {
            self.write(name, content.clone());
        }
        self.unnamed = Some(content);
    }

    /// Store a delete: shift the history, write register 1 + unnamed.
    /// Register 0 is untouched.
    pub fn store_delete(&mut self, data: RegisterData, kind: RangeKind) {
        let content = RegisterContent::new(data, kind);
        for i in (1..9).rev() {
            self.deletes[i] = self.deletes[i - 1].take();
        }
        self.deletes[0] = Some(content.clone());
        if let Some(name) = self.selected.take() {
            self.write(name, content.clone());
        }
        self.unnamed = Some(content);
    }

    /// Content for a paste: the selected register if one was chosen
    /// (consuming the selection), the unnamed register otherwise.
    pub fn paste_content(&mut self) -> Option<RegisterContent> {
        match self.selected.take() {
            Some(name) => self.get(name).cloned(),
            None => self.unnamed.clone(),
        }
    }

    /// Read a register by name
    pub fn get(&self, name: RegisterName) -> Option<&RegisterContent> {
        match name {
            RegisterName::Unnamed => self.unnamed.as_ref(),
            RegisterName::Numbered(0) => self.yank.as_ref(),
            RegisterName::Numbered(n) if (1..=9).contains(&n) => {
                self.deletes[n as usize - 1].as_ref()
            }
            RegisterName::Numbered(_) => None,
        }
    }

    fn write(&mut self, name: RegisterName, content: RegisterContent) {
        match name {
            RegisterName::Unnamed => self.unnamed = Some(content),
            RegisterName::Numbered(0) => self.yank = Some(content),
            RegisterName::Numbered(n) if (1..=9).contains(&n) => {
                self.deletes[n as usize - 1] = Some(content);
            }
            RegisterName::Numbered(_) => {}
        }
    }
}
