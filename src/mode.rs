//! Application mode state machine.
//!
//! The app is always in exactly one mode. Modal states (sample selection,
//! text input) remember the panel to return to, preventing invalid state
//! combinations.

// Allow dead code - some modal variants are defined for API completeness
#![allow(dead_code)]

/// The primary panels that can be focused in normal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    ChannelRack,
    PianoRoll,
    Playlist,
    Browser,
}

impl Panel {
    /// Get the next panel in tab order
    pub fn next(self, show_browser: bool, view_mode: ViewMode) -> Self {
        let main_panel = view_mode.panel();
        match self {
            Self::Browser => main_panel,
            Self::ChannelRack | Self::PianoRoll | Self::Playlist => {
                if show_browser {
                    Self::Browser
                } else {
                    main_panel
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelRack => "CHANNELRACK",
            Self::PianoRoll => "PIANOROLL",
            Self::Playlist => "PLAYLIST",
            Self::Browser => "BROWSER",
        }
    }
}

/// Which main view is currently shown (for the central area)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    ChannelRack,
    PianoRoll,
    Playlist,
}

impl ViewMode {
    /// The panel corresponding to this view
    pub fn panel(self) -> Panel {
        match self {
            Self::ChannelRack => Panel::ChannelRack,
            Self::PianoRoll => Panel::PianoRoll,
            Self::Playlist => Panel::Playlist,
        }
    }
}

/// Input target for text input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    ChannelRename { channel: usize },
    Tempo,
}

/// Application mode - exactly one is active at a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    /// Normal editing mode with a focused panel
    Normal { panel: Panel },

    /// Browser in selection mode (choosing a sample for a channel)
    BrowserSelection { channel: usize, return_to: Panel },

    /// Text input mode (tempo entry, renaming)
    TextInput { target: InputTarget, return_to: Panel },
}

impl Default for AppMode {
    fn default() -> Self {
        Self::Normal {
            panel: Panel::default(),
        }
    }
}

impl AppMode {
    /// Get the current panel (for rendering highlights, etc.)
    pub fn current_panel(&self) -> Panel {
        match self {
            Self::Normal { panel } => *panel,
            Self::BrowserSelection { .. } => Panel::Browser,
            Self::TextInput { return_to, .. } => *return_to,
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Normal { .. })
    }

    pub fn is_browser_selection(&self) -> bool {
        matches!(self, Self::BrowserSelection { .. })
    }

    /// Get browser selection channel if in that mode
    pub fn browser_selection_channel(&self) -> Option<usize> {
        match self {
            Self::BrowserSelection { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    pub fn is_text_input(&self) -> bool {
        matches!(self, Self::TextInput { .. })
    }

    /// Enter browser selection mode
    pub fn enter_browser_selection(&mut self, channel: usize) {
        let return_to = self.current_panel();
        *self = Self::BrowserSelection { channel, return_to };
    }

    /// Start text input
    pub fn start_text_input(&mut self, target: InputTarget) {
        let return_to = self.current_panel();
        *self = Self::TextInput { target, return_to };
    }

    /// Close current modal and return to the previous panel
    pub fn close_modal(&mut self) {
        *self = match self {
            Self::BrowserSelection { return_to, .. } => Self::Normal { panel: *return_to },
            Self::TextInput { return_to, .. } => Self::Normal { panel: *return_to },
            Self::Normal { panel } => Self::Normal { panel: *panel },
        };
    }

    /// Switch to a different panel (only valid in normal mode)
    pub fn switch_panel(&mut self, panel: Panel) {
        if let Self::Normal { panel: p } = self {
            *p = panel;
        }
    }

    /// Cycle to the next panel (only in normal mode)
    pub fn next_panel(&mut self, show_browser: bool, view_mode: ViewMode) {
        if let Self::Normal { panel } = self {
            *panel = panel.next(show_browser, view_mode);
        }
    }
}
