//! Vim-style modal editing - fully encapsulated state machine
//!
//! Design principles:
//! - All vim logic is encapsulated here
//! - Grids describe themselves via GridSemantics (zones, word intervals)
//!   and an optional row-content slice for word motions
//! - Vim processes keys and returns VimActions for the component to execute
//! - Vim doesn't know about pattern data, channels, registers or the jumplist

use serde::{Deserialize, Serialize};

use super::registers::RegisterName;

// ============================================================================
// Core Types
// ============================================================================

/// Vim editing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VimMode {
    #[default]
    Normal,
    Visual,
    VisualBlock,
    OperatorPending,
}

impl VimMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VimMode::Normal => "NORMAL",
            VimMode::Visual => "VISUAL",
            VimMode::VisualBlock => "V-BLOCK",
            VimMode::OperatorPending => "OP-PENDING",
        }
    }

    pub fn is_visual(&self) -> bool {
        matches!(self, VimMode::Visual | VimMode::VisualBlock)
    }
}

/// Pending operator waiting for a motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Delete,
    Yank,
    Change,
}

/// A 2D position in a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

// ============================================================================
// Grid Semantics - Zone-aware navigation
// ============================================================================

/// A zone within the grid (e.g., mute zone, name zone, steps zone)
#[derive(Debug, Clone)]
pub struct Zone {
    /// Column range [start, end] inclusive
    pub col_range: (usize, usize),
    /// Whether this is the main zone (anchor for 0/$ navigation)
    pub is_main: bool,
    /// Synthetic word boundaries every N columns (e.g., 4 for beat boundaries)
    pub word_interval: Option<usize>,
}

impl Zone {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            col_range: (start, end),
            is_main: false,
            word_interval: None,
        }
    }

    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }

    pub fn with_word_interval(mut self, interval: usize) -> Self {
        self.word_interval = Some(interval);
        self
    }

    /// Check if a column is within this zone
    pub fn contains_col(&self, col: usize) -> bool {
        col >= self.col_range.0 && col <= self.col_range.1
    }

    pub fn start(&self) -> usize {
        self.col_range.0
    }

    pub fn end(&self) -> usize {
        self.col_range.1
    }
}

/// Grid semantics configuration for zone-aware navigation
#[derive(Debug, Clone, Default)]
pub struct GridSemantics {
    /// Zones in left-to-right order, partitioning [0, cols-1]
    pub zones: Vec<Zone>,
}

impl GridSemantics {
    pub fn with_zones(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// Get the zone containing the given column
    pub fn zone_at_col(&self, col: usize) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains_col(col))
    }

    /// Get the main zone (exactly one zone is declared main)
    pub fn main_zone(&self) -> Option<&Zone> {
        self.zones.iter().find(|z| z.is_main)
    }

    /// Get the zone adjacent on the left (for h motion at zone boundary)
    pub fn prev_zone(&self, current_col: usize) -> Option<&Zone> {
        let current = self.zone_at_col(current_col)?;
        self.zones.iter().find(|z| z.end() + 1 == current.start())
    }

    /// Get the zone adjacent on the right (for l motion at zone boundary)
    pub fn next_zone(&self, current_col: usize) -> Option<&Zone> {
        let current = self.zone_at_col(current_col)?;
        self.zones.iter().find(|z| z.start() == current.end() + 1)
    }
}

/// Selection range type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeKind {
    #[default]
    Char,
    Line,
    Block,
}

/// A selection range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
    pub kind: RangeKind,
}

impl Range {
    /// Get normalized range (start <= end component-wise)
    pub fn normalized(&self) -> (Position, Position) {
        let min_row = self.start.row.min(self.end.row);
        let max_row = self.start.row.max(self.end.row);
        let min_col = self.start.col.min(self.end.col);
        let max_col = self.start.col.max(self.end.col);

        (
            Position::new(min_row, min_col),
            Position::new(max_row, max_col),
        )
    }

    /// Check if a position is within the selection
    pub fn contains(&self, pos: Position) -> bool {
        match self.kind {
            RangeKind::Block => {
                let (start, end) = self.normalized();
                pos.row >= start.row
                    && pos.row <= end.row
                    && pos.col >= start.col
                    && pos.col <= end.col
            }
            RangeKind::Line => {
                let min_row = self.start.row.min(self.end.row);
                let max_row = self.start.row.max(self.end.row);
                pos.row >= min_row && pos.row <= max_row
            }
            RangeKind::Char => {
                // Char selections are directional - normalize row order but
                // preserve column semantics based on direction
                let (start, end) = if self.start.row < self.end.row
                    || (self.start.row == self.end.row && self.start.col <= self.end.col)
                {
                    (self.start, self.end)
                } else {
                    (self.end, self.start)
                };

                if pos.row < start.row || pos.row > end.row {
                    return false;
                }
                if start.row == end.row {
                    pos.col >= start.col && pos.col <= end.col
                } else if pos.row == start.row {
                    pos.col >= start.col
                } else if pos.row == end.row {
                    pos.col <= end.col
                } else {
                    true
                }
            }
        }
    }
}

/// Grid dimensions for boundary checking
#[derive(Debug, Clone, Copy)]
pub struct GridDimensions {
    pub rows: usize,
    pub cols: usize,
}

// ============================================================================
// Actions - What vim tells the component to do
// ============================================================================

/// Actions that vim returns for the component to execute
#[derive(Debug, Clone, PartialEq)]
pub enum VimAction {
    /// Move cursor to position
    MoveCursor(Position),

    /// Toggle item at current position (like 'x' in normal mode)
    Toggle,

    /// Yank the given range (component reads data and stores it in the registers)
    Yank(Range),

    /// Delete the given range (component deletes and stores it in the registers)
    Delete(Range),

    /// Paste after current position (p)
    Paste,

    /// Paste before current position (P)
    PasteBefore,

    /// Select a register for the next yank/delete/paste ("0 .. "9, "")
    SelectRegister(RegisterName),

    /// Push the current position onto the jumplist (before a jump motion)
    PushJump,

    /// Jumplist back (Ctrl+o)
    JumpBack,

    /// Jumplist forward (Ctrl+i)
    JumpForward,

    /// Visual selection changed (for UI highlighting)
    SelectionChanged(Option<Range>),

    /// Mode changed (for status bar)
    ModeChanged(VimMode),

    /// Escape was pressed; carries the mode we left
    Escape(VimMode),

    /// Scroll viewport by N lines (positive = down)
    ScrollViewport(i32),
}

// ============================================================================
// Dot Repeat
// ============================================================================

/// Last repeatable action for the `.` command
#[derive(Debug, Clone)]
pub enum RepeatableAction {
    /// Operator + motion (dd/yy/cc store the operator letter as the motion)
    OperatorMotion {
        operator: Operator,
        motion: char,
        count: Option<usize>,
    },
    /// Toggle at position
    Toggle,
    /// Paste
    Paste { before: bool },
}

// ============================================================================
// Motions
// ============================================================================

/// Result of evaluating a motion
#[derive(Debug, Clone, Copy)]
struct MotionResult {
    pos: Position,
    linewise: bool,
    inclusive: bool,
}

impl MotionResult {
    fn char_exclusive(pos: Position) -> Self {
        Self {
            pos,
            linewise: false,
            inclusive: false,
        }
    }

    fn char_inclusive(pos: Position) -> Self {
        Self {
            pos,
            linewise: false,
            inclusive: true,
        }
    }

    fn linewise(pos: Position) -> Self {
        Self {
            pos,
            linewise: true,
            inclusive: false,
        }
    }
}

// ============================================================================
// Vim State Machine
// ============================================================================

/// The main vim state machine.
///
/// Registers and the jumplist live outside (they are shared across grids);
/// the machine emits actions that route through them.
#[derive(Debug, Clone)]
pub struct VimState {
    /// Current mode
    mode: VimMode,

    /// Pending operator (d, y, c)
    operator: Option<Operator>,

    /// Visual selection anchor
    visual_anchor: Option<Position>,

    /// Accumulated count (None = no count typed; raw count matters for gg/G)
    count: Option<usize>,

    /// A lone 'g' was pressed (waiting for the second g)
    pending_g: bool,

    /// A '"' was pressed (waiting for a register name)
    pending_register: bool,

    /// Grid dimensions for bounds checking
    dimensions: GridDimensions,

    /// Grid semantics for zone-aware navigation
    grid_semantics: Option<GridSemantics>,

    /// Last repeatable action for the dot command
    last_action: Option<RepeatableAction>,
}

impl VimState {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            mode: VimMode::Normal,
            operator: None,
            visual_anchor: None,
            count: None,
            pending_g: false,
            pending_register: false,
            dimensions: GridDimensions { rows, cols },
            grid_semantics: None,
            last_action: None,
        }
    }

    /// Create a new VimState with grid semantics (zones)
    pub fn with_grid_semantics(rows: usize, cols: usize, semantics: GridSemantics) -> Self {
        let mut state = Self::new(rows, cols);
        state.grid_semantics = Some(semantics);
        state
    }

    // ========================================================================
    // Public getters
    // ========================================================================

    pub fn mode(&self) -> VimMode {
        self.mode
    }

    pub fn is_visual(&self) -> bool {
        self.mode.is_visual()
    }

    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    pub fn count(&self) -> Option<usize> {
        self.count
    }

    pub fn visual_anchor(&self) -> Option<Position> {
        self.visual_anchor
    }

    pub fn get_selection(&self, cursor: Position) -> Option<Range> {
        self.visual_anchor.map(|anchor| Range {
            start: anchor,
            end: cursor,
            kind: match self.mode {
                VimMode::VisualBlock => RangeKind::Block,
                _ => RangeKind::Char,
            },
        })
    }

    pub fn update_dimensions(&mut self, rows: usize, cols: usize) {
        self.dimensions = GridDimensions { rows, cols };
    }

    pub fn set_grid_semantics(&mut self, semantics: GridSemantics) {
        self.grid_semantics = Some(semantics);
    }

    // ========================================================================
    // Key processing - the main entry point
    // ========================================================================

    /// Process a key and return action(s) for the component to execute.
    ///
    /// `content` is the cursor row's content in vim-column space, used for
    /// word detection by w/b/e; pass None for grids without word content.
    ///
    /// Returns a Vec because some keys trigger multiple actions
    /// (e.g., 'd' in visual mode triggers Yank, Delete, and ModeChanged).
    pub fn process_key(
        &mut self,
        key: char,
        ctrl: bool,
        cursor: Position,
        content: Option<&[bool]>,
    ) -> Vec<VimAction> {
        let mut actions = Vec::new();

        // Escape always returns to normal and clears pending state
        if key == '\x1b' {
            let prev_mode = self.mode;
            self.reset_to_normal();
            if prev_mode != VimMode::Normal {
                actions.push(VimAction::SelectionChanged(None));
                actions.push(VimAction::ModeChanged(VimMode::Normal));
            }
            actions.push(VimAction::Escape(prev_mode));
            return actions;
        }

        match self.mode {
            VimMode::Normal => self.process_normal(key, ctrl, cursor, content, &mut actions),
            VimMode::Visual | VimMode::VisualBlock => {
                self.process_visual(key, ctrl, cursor, content, &mut actions)
            }
            VimMode::OperatorPending => {
                self.process_operator_pending(key, ctrl, cursor, content, &mut actions)
            }
        }

        actions
    }

    // ========================================================================
    // Mode-specific processing
    // ========================================================================

    fn process_normal(
        &mut self,
        key: char,
        ctrl: bool,
        cursor: Position,
        content: Option<&[bool]>,
        actions: &mut Vec<VimAction>,
    ) {
        // Register selection: '"' then a digit
        if self.pending_register {
            self.pending_register = false;
            if let Some(name) = RegisterName::from_char(key) {
                actions.push(VimAction::SelectRegister(name));
            }
            return;
        }

        // Pending 'g': a second g is the gg jump, anything else aborts the
        // sequence and swallows the key
        if self.pending_g {
            self.pending_g = false;
            if key == 'g' && !ctrl {
                let row = self.jump_target_row(true);
                self.count = None;
                actions.push(VimAction::PushJump);
                actions.push(VimAction::MoveCursor(Position::new(row, cursor.col)));
            } else {
                self.count = None;
            }
            return;
        }

        match key {
            // Count accumulation
            '1'..='9' if self.count.is_none() => {
                self.count = Some((key as u8 - b'0') as usize);
            }
            '0'..='9' if self.count.is_some() => {
                let current = self.count.unwrap();
                self.count = Some(current * 10 + (key as u8 - b'0') as usize);
            }

            // Register selection prefix
            '"' => {
                self.pending_register = true;
            }

            // Visual modes
            'v' if !ctrl => {
                self.mode = VimMode::Visual;
                self.visual_anchor = Some(cursor);
                actions.push(VimAction::ModeChanged(VimMode::Visual));
                actions.push(VimAction::SelectionChanged(self.get_selection(cursor)));
            }
            'v' if ctrl => {
                self.mode = VimMode::VisualBlock;
                self.visual_anchor = Some(cursor);
                actions.push(VimAction::ModeChanged(VimMode::VisualBlock));
                actions.push(VimAction::SelectionChanged(self.get_selection(cursor)));
            }

            // Operators (enter operator-pending mode)
            'd' if !ctrl => {
                self.operator = Some(Operator::Delete);
                self.mode = VimMode::OperatorPending;
                actions.push(VimAction::ModeChanged(VimMode::OperatorPending));
            }
            'y' if !ctrl => {
                self.operator = Some(Operator::Yank);
                self.mode = VimMode::OperatorPending;
                actions.push(VimAction::ModeChanged(VimMode::OperatorPending));
            }
            'c' if !ctrl => {
                self.operator = Some(Operator::Change);
                self.mode = VimMode::OperatorPending;
                actions.push(VimAction::ModeChanged(VimMode::OperatorPending));
            }

            // Paste
            'p' => {
                actions.push(VimAction::Paste);
                self.last_action = Some(RepeatableAction::Paste { before: false });
            }
            'P' => {
                actions.push(VimAction::PasteBefore);
                self.last_action = Some(RepeatableAction::Paste { before: true });
            }

            // Toggle ('x' or Enter in normal mode)
            'x' | '\r' => {
                actions.push(VimAction::Toggle);
                self.last_action = Some(RepeatableAction::Toggle);
            }

            // Dot repeat
            '.' => {
                let new_count = self.count.take();
                if let Some(action) = self.last_action.clone() {
                    match action {
                        RepeatableAction::Toggle => {
                            actions.push(VimAction::Toggle);
                        }
                        RepeatableAction::Paste { before } => {
                            if before {
                                actions.push(VimAction::PasteBefore);
                            } else {
                                actions.push(VimAction::Paste);
                            }
                        }
                        RepeatableAction::OperatorMotion {
                            operator,
                            motion,
                            count,
                        } => {
                            // Replay with a fresh count prefix if one was typed
                            self.count = new_count.or(count);
                            self.operator = Some(operator);
                            self.mode = VimMode::OperatorPending;
                            // A recorded 'g' motion is a gg jump: feed the
                            // pending-g pair
                            if motion == 'g' {
                                self.process_operator_pending(
                                    'g', false, cursor, content, actions,
                                );
                            }
                            self.process_operator_pending(motion, false, cursor, content, actions);
                        }
                    }
                }
            }

            // Motions ('e' has a guard to avoid conflict with Ctrl+e)
            'h' | 'j' | 'k' | 'l' | 'w' | 'b' => {
                if let Some(result) = self.apply_motion(key, cursor, content) {
                    actions.push(VimAction::MoveCursor(result.pos));
                }
                self.count = None;
            }
            'e' if !ctrl => {
                if let Some(result) = self.apply_motion(key, cursor, content) {
                    actions.push(VimAction::MoveCursor(result.pos));
                }
                self.count = None;
            }

            // Main-zone start/end
            '0' if self.count.is_none() => {
                actions.push(VimAction::MoveCursor(Position::new(
                    cursor.row,
                    self.main_zone_start(),
                )));
            }
            '$' => {
                actions.push(VimAction::MoveCursor(Position::new(
                    cursor.row,
                    self.main_zone_end(),
                )));
                self.count = None;
            }

            // Jump motions
            'g' => {
                self.pending_g = true;
            }
            'G' => {
                let row = self.jump_target_row(false);
                self.count = None;
                actions.push(VimAction::PushJump);
                actions.push(VimAction::MoveCursor(Position::new(row, cursor.col)));
            }

            // Jumplist navigation
            'o' if ctrl => {
                actions.push(VimAction::JumpBack);
            }
            'i' if ctrl => {
                actions.push(VimAction::JumpForward);
            }

            // Half-page scroll
            'd' if ctrl => {
                let half_page = self.dimensions.rows / 2;
                let new_row = (cursor.row + half_page).min(self.dimensions.rows.saturating_sub(1));
                actions.push(VimAction::MoveCursor(Position::new(new_row, cursor.col)));
            }
            'u' if ctrl => {
                let half_page = self.dimensions.rows / 2;
                let new_row = cursor.row.saturating_sub(half_page);
                actions.push(VimAction::MoveCursor(Position::new(new_row, cursor.col)));
            }

            // Single-line scroll
            'e' if ctrl => {
                actions.push(VimAction::ScrollViewport(1));
            }
            'y' if ctrl => {
                actions.push(VimAction::ScrollViewport(-1));
            }

            _ => {}
        }
    }

    fn process_visual(
        &mut self,
        key: char,
        ctrl: bool,
        cursor: Position,
        content: Option<&[bool]>,
        actions: &mut Vec<VimAction>,
    ) {
        // Aborted g-sequences swallow the key here too; the selection and
        // visual mode stay as they were
        if self.pending_g {
            self.pending_g = false;
            if key == 'g' && !ctrl {
                let row = self.jump_target_row(true);
                self.count = None;
                let new_pos = Position::new(row, cursor.col);
                actions.push(VimAction::MoveCursor(new_pos));
                actions.push(VimAction::SelectionChanged(self.get_selection(new_pos)));
            } else {
                self.count = None;
            }
            return;
        }

        match key {
            // Count accumulation
            '1'..='9' if self.count.is_none() => {
                self.count = Some((key as u8 - b'0') as usize);
            }
            '0'..='9' if self.count.is_some() => {
                let current = self.count.unwrap();
                self.count = Some(current * 10 + (key as u8 - b'0') as usize);
            }

            // Switch between visual modes (anchor preserved across v <-> Ctrl+v)
            'v' if !ctrl && self.mode == VimMode::Visual => {
                self.reset_to_normal();
                actions.push(VimAction::SelectionChanged(None));
                actions.push(VimAction::ModeChanged(VimMode::Normal));
            }
            'v' if !ctrl && self.mode == VimMode::VisualBlock => {
                self.mode = VimMode::Visual;
                actions.push(VimAction::ModeChanged(VimMode::Visual));
                actions.push(VimAction::SelectionChanged(self.get_selection(cursor)));
            }
            'v' if ctrl => {
                if self.mode == VimMode::VisualBlock {
                    self.reset_to_normal();
                    actions.push(VimAction::SelectionChanged(None));
                    actions.push(VimAction::ModeChanged(VimMode::Normal));
                } else {
                    self.mode = VimMode::VisualBlock;
                    actions.push(VimAction::ModeChanged(VimMode::VisualBlock));
                    actions.push(VimAction::SelectionChanged(self.get_selection(cursor)));
                }
            }

            // Operators on selection
            'y' if !ctrl => {
                if let Some(range) = self.get_selection(cursor) {
                    actions.push(VimAction::Yank(range));
                }
                self.reset_to_normal();
                actions.push(VimAction::SelectionChanged(None));
                actions.push(VimAction::ModeChanged(VimMode::Normal));
            }
            'd' if !ctrl => {
                if let Some(range) = self.get_selection(cursor) {
                    actions.push(VimAction::Yank(range));
                    actions.push(VimAction::Delete(range));
                }
                self.reset_to_normal();
                actions.push(VimAction::SelectionChanged(None));
                actions.push(VimAction::ModeChanged(VimMode::Normal));
            }
            'c' | 'x' => {
                if let Some(range) = self.get_selection(cursor) {
                    actions.push(VimAction::Yank(range));
                    actions.push(VimAction::Delete(range));
                }
                self.reset_to_normal();
                actions.push(VimAction::SelectionChanged(None));
                actions.push(VimAction::ModeChanged(VimMode::Normal));
            }

            // Half-page scroll in visual mode
            'd' if ctrl => {
                let half_page = self.dimensions.rows / 2;
                let new_row = (cursor.row + half_page).min(self.dimensions.rows.saturating_sub(1));
                let new_pos = Position::new(new_row, cursor.col);
                actions.push(VimAction::MoveCursor(new_pos));
                actions.push(VimAction::SelectionChanged(self.get_selection(new_pos)));
            }
            'u' if ctrl => {
                let half_page = self.dimensions.rows / 2;
                let new_row = cursor.row.saturating_sub(half_page);
                let new_pos = Position::new(new_row, cursor.col);
                actions.push(VimAction::MoveCursor(new_pos));
                actions.push(VimAction::SelectionChanged(self.get_selection(new_pos)));
            }

            // Motions (extend selection)
            'h' | 'j' | 'k' | 'l' | 'w' | 'b' => {
                if let Some(result) = self.apply_motion(key, cursor, content) {
                    actions.push(VimAction::MoveCursor(result.pos));
                    actions.push(VimAction::SelectionChanged(self.get_selection(result.pos)));
                }
                self.count = None;
            }
            'e' if !ctrl => {
                if let Some(result) = self.apply_motion(key, cursor, content) {
                    actions.push(VimAction::MoveCursor(result.pos));
                    actions.push(VimAction::SelectionChanged(self.get_selection(result.pos)));
                }
                self.count = None;
            }

            '0' => {
                let new_pos = Position::new(cursor.row, self.main_zone_start());
                actions.push(VimAction::MoveCursor(new_pos));
                actions.push(VimAction::SelectionChanged(self.get_selection(new_pos)));
            }
            '$' => {
                let new_pos = Position::new(cursor.row, self.main_zone_end());
                actions.push(VimAction::MoveCursor(new_pos));
                actions.push(VimAction::SelectionChanged(self.get_selection(new_pos)));
                self.count = None;
            }
            'g' => {
                self.pending_g = true;
            }
            'G' => {
                let row = self.jump_target_row(false);
                self.count = None;
                let new_pos = Position::new(row, cursor.col);
                actions.push(VimAction::MoveCursor(new_pos));
                actions.push(VimAction::SelectionChanged(self.get_selection(new_pos)));
            }

            _ => {}
        }
    }

    fn process_operator_pending(
        &mut self,
        key: char,
        ctrl: bool,
        cursor: Position,
        content: Option<&[bool]>,
        actions: &mut Vec<VimAction>,
    ) {
        let operator = self.operator;

        // Count accumulation stays in operator-pending mode
        match key {
            '1'..='9' if self.count.is_none() => {
                self.count = Some((key as u8 - b'0') as usize);
                return;
            }
            '0'..='9' if self.count.is_some() => {
                let current = self.count.unwrap();
                self.count = Some(current * 10 + (key as u8 - b'0') as usize);
                return;
            }
            _ => {}
        }

        // Pending 'g' for dgg / ygg / cgg
        if self.pending_g {
            self.pending_g = false;
            if key == 'g' && !ctrl {
                let row = self.jump_target_row(true);
                self.close_operator(
                    operator,
                    'g',
                    MotionResult::linewise(Position::new(row, cursor.col)),
                    cursor,
                    actions,
                );
                return;
            }
            // unknown g-sequence: abort the operator
            self.reset_to_normal();
            actions.push(VimAction::ModeChanged(VimMode::Normal));
            return;
        }

        // Operator switching and line-wise doubles (dd, yy, cc)
        let key_operator = match key {
            'd' if !ctrl => Some(Operator::Delete),
            'y' if !ctrl => Some(Operator::Yank),
            'c' if !ctrl => Some(Operator::Change),
            _ => None,
        };

        if let Some(new_op) = key_operator {
            if operator == Some(new_op) {
                // Same operator twice = line-wise operation over count rows
                let count = self.count.unwrap_or(1);
                let end_row = (cursor.row + count - 1).min(self.dimensions.rows.saturating_sub(1));
                let range = Range {
                    start: Position::new(cursor.row, 0),
                    end: Position::new(end_row, self.dimensions.cols.saturating_sub(1)),
                    kind: RangeKind::Line,
                };
                self.emit_operator(new_op, range, actions);
                self.last_action = Some(RepeatableAction::OperatorMotion {
                    operator: new_op,
                    motion: key,
                    count: Some(count),
                });
                self.reset_to_normal();
                actions.push(VimAction::ModeChanged(VimMode::Normal));
            } else {
                // Different operator - switch and clear the count
                self.operator = Some(new_op);
                self.count = None;
            }
            return;
        }

        // Motion closes the operator
        let result = match key {
            'h' | 'j' | 'k' | 'l' | 'w' | 'b' => self.apply_motion(key, cursor, content),
            'e' if !ctrl => self.apply_motion(key, cursor, content),
            '0' => Some(MotionResult::char_exclusive(Position::new(
                cursor.row,
                self.main_zone_start(),
            ))),
            '$' => Some(MotionResult::char_inclusive(Position::new(
                cursor.row,
                self.main_zone_end(),
            ))),
            'g' => {
                self.pending_g = true;
                return;
            }
            'G' => Some(MotionResult::linewise(Position::new(
                self.jump_target_row(false),
                cursor.col,
            ))),
            _ => None,
        };

        if let Some(result) = result {
            self.close_operator(operator, key, result, cursor, actions);
        } else {
            // Unknown key in operator-pending: silent no-op, reset state
            self.reset_to_normal();
            actions.push(VimAction::ModeChanged(VimMode::Normal));
        }
    }

    /// Build the operator range from a motion result and emit yank/delete.
    fn close_operator(
        &mut self,
        operator: Option<Operator>,
        motion: char,
        result: MotionResult,
        cursor: Position,
        actions: &mut Vec<VimAction>,
    ) {
        let recorded_count = self.count;
        let range = self.operator_range(motion, result, cursor);

        if let (Some(op), Some(range)) = (operator, range) {
            self.emit_operator(op, range, actions);
            self.last_action = Some(RepeatableAction::OperatorMotion {
                operator: op,
                motion,
                count: recorded_count,
            });
        }

        self.reset_to_normal();
        actions.push(VimAction::ModeChanged(VimMode::Normal));
    }

    /// Operator-range construction rules.
    ///
    /// Returns None for degenerate ranges (motion that did not move).
    fn operator_range(
        &self,
        motion: char,
        result: MotionResult,
        cursor: Position,
    ) -> Option<Range> {
        let pos = result.pos;
        let max_col = self.dimensions.cols.saturating_sub(1);

        if result.linewise {
            let min_row = cursor.row.min(pos.row);
            let max_row = cursor.row.max(pos.row);
            return Some(Range {
                start: Position::new(min_row, 0),
                end: Position::new(max_row, max_col),
                kind: RangeKind::Line,
            });
        }

        // 'w' crossing into the next row: do not consume the next line's
        // leading cells - truncate to the end of the cursor row, inclusive
        if motion == 'w' && pos.row > cursor.row {
            return Some(Range {
                start: cursor,
                end: Position::new(cursor.row, max_col),
                kind: RangeKind::Char,
            });
        }

        let backward = (pos.row, pos.col) < (cursor.row, cursor.col);
        if backward {
            return Some(Range {
                start: pos,
                end: cursor,
                kind: RangeKind::Char,
            });
        }

        let end = if result.inclusive {
            pos
        } else {
            // Forward exclusive: stop one column short of the target
            if pos.col == cursor.col && pos.row == cursor.row {
                return None; // motion didn't move
            }
            Position::new(pos.row, pos.col.checked_sub(1)?)
        };

        if (end.row, end.col) < (cursor.row, cursor.col) {
            return None;
        }

        Some(Range {
            start: cursor,
            end,
            kind: RangeKind::Char,
        })
    }

    fn emit_operator(&self, op: Operator, range: Range, actions: &mut Vec<VimAction>) {
        match op {
            Operator::Yank => actions.push(VimAction::Yank(range)),
            Operator::Delete | Operator::Change => {
                actions.push(VimAction::Yank(range));
                actions.push(VimAction::Delete(range));
            }
        }
    }

    // ========================================================================
    // Motions
    // ========================================================================

    /// Target row for gg/G; the raw count is significant:
    /// raw 0 means first/last row, raw k means row k-1.
    fn jump_target_row(&self, top: bool) -> usize {
        let max_row = self.dimensions.rows.saturating_sub(1);
        match self.count.unwrap_or(0) {
            0 => {
                if top {
                    0
                } else {
                    max_row
                }
            }
            k => (k - 1).min(max_row),
        }
    }

    fn main_zone_start(&self) -> usize {
        self.grid_semantics
            .as_ref()
            .and_then(|gs| gs.main_zone())
            .map(|z| z.start())
            .unwrap_or(0)
    }

    fn main_zone_end(&self) -> usize {
        self.grid_semantics
            .as_ref()
            .and_then(|gs| gs.main_zone())
            .map(|z| z.end())
            .unwrap_or_else(|| self.dimensions.cols.saturating_sub(1))
    }

    fn apply_motion(
        &self,
        key: char,
        cursor: Position,
        content: Option<&[bool]>,
    ) -> Option<MotionResult> {
        let count = self.count.unwrap_or(1);
        let max_row = self.dimensions.rows.saturating_sub(1);
        let max_col = self.dimensions.cols.saturating_sub(1);

        match key {
            'h' => {
                // Zone-aware left motion: cross zone boundaries
                let mut col = cursor.col;
                for _ in 0..count {
                    if let Some(ref gs) = self.grid_semantics {
                        if let Some(zone) = gs.zone_at_col(col) {
                            if col > zone.start() {
                                col -= 1;
                            } else if let Some(prev) = gs.prev_zone(col) {
                                // At zone boundary: enter previous zone at its end
                                col = prev.end();
                            }
                            // Else: at the leftmost zone's edge, stay
                        } else {
                            col = col.saturating_sub(1);
                        }
                    } else {
                        col = col.saturating_sub(1);
                    }
                }
                Some(MotionResult::char_exclusive(Position::new(cursor.row, col)))
            }
            'l' => {
                // Zone-aware right motion: cross zone boundaries
                let mut col = cursor.col;
                for _ in 0..count {
                    if let Some(ref gs) = self.grid_semantics {
                        if let Some(zone) = gs.zone_at_col(col) {
                            if col < zone.end() {
                                col += 1;
                            } else if let Some(next) = gs.next_zone(col) {
                                // At zone boundary: enter next zone at its start
                                col = next.start();
                            }
                        } else {
                            col = (col + 1).min(max_col);
                        }
                    } else {
                        col = (col + 1).min(max_col);
                    }
                }
                Some(MotionResult::char_exclusive(Position::new(cursor.row, col)))
            }
            'k' => Some(MotionResult::linewise(Position::new(
                cursor.row.saturating_sub(count),
                cursor.col,
            ))),
            'j' => Some(MotionResult::linewise(Position::new(
                (cursor.row + count).min(max_row),
                cursor.col,
            ))),
            'w' => {
                let mut pos = cursor;
                for _ in 0..count {
                    pos = self.word_forward(pos, content);
                }
                Some(MotionResult::char_exclusive(pos))
            }
            'b' => {
                let mut col = cursor.col;
                for _ in 0..count {
                    col = self.word_backward(Position::new(cursor.row, col), content);
                }
                Some(MotionResult::char_exclusive(Position::new(cursor.row, col)))
            }
            'e' => {
                let mut col = cursor.col;
                for _ in 0..count {
                    col = self.word_end(Position::new(cursor.row, col), content);
                }
                Some(MotionResult::char_inclusive(Position::new(cursor.row, col)))
            }
            _ => None,
        }
    }

    /// Is `col` a word-start within `zone`?
    ///
    /// Holds when the zone's word interval lands on it (past the zone start),
    /// or when the content turns on at this column.
    fn is_word_start(&self, zone: &Zone, col: usize, content: Option<&[bool]>) -> bool {
        if let Some(interval) = zone.word_interval {
            if col > zone.start() && (col - zone.start()) % interval == 0 {
                return true;
            }
        }
        if let Some(content) = content {
            let here = content.get(col).copied().unwrap_or(false);
            let before = col
                .checked_sub(1)
                .and_then(|c| content.get(c).copied())
                .unwrap_or(false);
            if here && !before {
                return true;
            }
        }
        false
    }

    /// Next word-start within the cursor's zone; wraps to the next row's zone
    /// start when nothing remains (vim parity at end of line).
    fn word_forward(&self, cursor: Position, content: Option<&[bool]>) -> Position {
        let max_row = self.dimensions.rows.saturating_sub(1);
        let Some(zone) = self
            .grid_semantics
            .as_ref()
            .and_then(|gs| gs.zone_at_col(cursor.col))
            .cloned()
        else {
            return cursor;
        };

        for col in (cursor.col + 1)..=zone.end() {
            if self.is_word_start(&zone, col, content) {
                return Position::new(cursor.row, col);
            }
        }

        // No word-start remains in this zone
        if cursor.row < max_row {
            Position::new(cursor.row + 1, zone.start())
        } else {
            Position::new(cursor.row, zone.end())
        }
    }

    /// Previous word-start within the cursor's zone. On content, this walks
    /// left to the start of the contiguous run first.
    fn word_backward(&self, cursor: Position, content: Option<&[bool]>) -> usize {
        let Some(zone) = self
            .grid_semantics
            .as_ref()
            .and_then(|gs| gs.zone_at_col(cursor.col))
            .cloned()
        else {
            return cursor.col;
        };

        let mut col = cursor.col;
        while col > zone.start() {
            col -= 1;
            if self.is_word_start(&zone, col, content) {
                return col;
            }
        }
        zone.start()
    }

    /// End-of-word column. On content, walk right while the content run
    /// continues; otherwise fall back to the zone's synthetic word grid.
    fn word_end(&self, cursor: Position, content: Option<&[bool]>) -> usize {
        let Some(zone) = self
            .grid_semantics
            .as_ref()
            .and_then(|gs| gs.zone_at_col(cursor.col))
            .cloned()
        else {
            return cursor.col;
        };

        let at = |col: usize| -> bool {
            content
                .and_then(|c| c.get(col).copied())
                .unwrap_or(false)
        };

        if content.is_some() && zone.word_interval.is_none() {
            let mut col = cursor.col;
            if at(col) && col < zone.end() && at(col + 1) {
                // On content with more content ahead: walk to the run end
                while col < zone.end() && at(col + 1) {
                    col += 1;
                }
                return col;
            }
            // Skip non-content (or a run end), then walk to the next run's end
            let mut scan = col + 1;
            while scan <= zone.end() && !at(scan) {
                scan += 1;
            }
            if scan > zone.end() {
                return zone.end();
            }
            let mut end = scan;
            while end < zone.end() && at(end + 1) {
                end += 1;
            }
            return end;
        }

        if let Some(interval) = zone.word_interval {
            let offset = cursor.col - zone.start();
            let current_word = offset / interval;
            let word_end = zone.start() + ((current_word + 1) * interval).saturating_sub(1);
            if cursor.col >= word_end.min(zone.end()) {
                // Already at this word's end: go to the next word's end
                let next_end = zone.start() + ((current_word + 2) * interval).saturating_sub(1);
                return next_end.min(zone.end());
            }
            return word_end.min(zone.end());
        }

        zone.end()
    }

    fn reset_to_normal(&mut self) {
        self.mode = VimMode::Normal;
        self.operator = None;
        self.visual_anchor = None;
        self.count = None;
        self.pending_g = false;
        self.pending_register = false;
    }
}

// ============================================================================
// Tests - Comprehensive test suite in vim_tests.rs
// ============================================================================

#[cfg(test)]
#[path = "vim_tests.rs"]
mod tests;
