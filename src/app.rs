//! Application state and core logic.
//!
//! `App` is the arena owning every component: the song (model store), the
//! journal, the shared registers and jumplist, the per-grid vim machines,
//! the transport and the collaborator handles. Components refer to each
//! other through `App`, never through back-pointers.

use std::path::PathBuf;
use std::time::Duration;

use tui_input::Input;

use crate::audio::AudioHandle;
use crate::autosave::Autosave;
use crate::browser::BrowserState;
use crate::command::AppCommand;
use crate::coords::{AppCol, MidiPitch, VimCol};
use crate::cursor::Cursors;
use crate::event_log::EventLog;
use crate::history::command::CursorSnapshot;
use crate::history::{Command, EditOp, JumpPosition, Journal, Jumplist};
use crate::input::context::{PianoRollContext, PlaylistContext, StepGridContext};
use crate::input::registers::RegisterFile;
use crate::input::vim::{GridSemantics, Position, VimState, Zone};
use crate::playback::{Transport, TransportMode};
use crate::project::{self, ProjectError, ProjectFile};
use crate::song::{ChannelKind, Note, Song, NUM_STEPS};

// Re-export types from mode module for external use
pub use crate::mode::{AppMode, InputTarget, Panel, ViewMode};

/// Piano roll rows: C2..C6 inclusive
pub const PIANO_ROWS: usize =
    (MidiPitch::PIANO_MAX.0 - MidiPitch::PIANO_MIN.0) as usize + 1;

/// A note placement in progress (piano roll): started with 'x', committed
/// by a second 'x', canceled by Escape. Not yet in the model or journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNote {
    pub pitch: u8,
    pub start_step: usize,
}

/// One vim machine per grid; dimensions are refreshed before use
pub struct VimStates {
    pub channel_rack: VimState,
    pub piano_roll: VimState,
    pub playlist: VimState,
    pub browser: VimState,
}

impl VimStates {
    fn new(num_channels: usize) -> Self {
        // Channel rack zones in vim space: mute (0), name (1),
        // steps (2-17, the main zone, beat words every 4)
        let channel_rack_zones = GridSemantics::with_zones(vec![
            Zone::new(0, 0),
            Zone::new(1, 1),
            Zone::new(2, 17).main().with_word_interval(4),
        ]);

        // Piano roll: one main zone of 16 steps
        let piano_roll_zones =
            GridSemantics::with_zones(vec![Zone::new(0, 15).main().with_word_interval(4)]);

        // Playlist: pattern-mute column (0), bars (1-16, main)
        let playlist_zones = GridSemantics::with_zones(vec![
            Zone::new(0, 0),
            Zone::new(1, 16).main().with_word_interval(4),
        ]);

        Self {
            channel_rack: VimState::with_grid_semantics(
                num_channels.max(1),
                VimCol::COUNT,
                channel_rack_zones,
            ),
            piano_roll: VimState::with_grid_semantics(PIANO_ROWS, NUM_STEPS, piano_roll_zones),
            playlist: VimState::with_grid_semantics(1, 17, playlist_zones),
            browser: VimState::new(1, 1),
        }
    }
}

/// Main application state
pub struct App {
    pub project_name: String,
    pub project_path: PathBuf,
    pub should_quit: bool,

    /// The musical model
    pub song: Song,

    pub mode: AppMode,
    pub view_mode: ViewMode,
    pub show_browser: bool,

    pub transport: Transport,
    pub cursors: Cursors,
    pub vim: VimStates,

    /// Shared vim registers (one file for every grid)
    pub registers: RegisterFile,
    /// Undo/redo journal
    pub journal: Journal,
    /// Cross-view jumplist
    pub jumplist: Jumplist,

    pub browser: BrowserState,
    pub autosave: Autosave,
    pub event_log: EventLog,
    pub audio: AudioHandle,

    pub terminal_width: u16,
    pub terminal_height: u16,

    /// Whether a preview is sounding (hold-to-preview)
    pub is_previewing: bool,
    /// In-progress note placement in the piano roll
    pub pending_note: Option<PendingNote>,
    /// Text input buffer for tempo/rename entry
    pub text_input: Input,
}

impl App {
    /// Open or create a project.
    ///
    /// A load failure (including a version mismatch) is fatal for the
    /// session and propagates to the caller.
    pub fn new(project_name: &str, audio: AudioHandle) -> Result<Self, ProjectError> {
        let project_path = PathBuf::from(project_name);

        let (song, created) = if project::is_valid_project(&project_path) {
            (project::load_project(&project_path)?.into_song(), false)
        } else {
            (Song::new(project_name), true)
        };

        let num_channels = song.channels.len();
        let samples_path = project::samples_dir(&project_path);

        let mut app = Self {
            project_name: project_name.to_string(),
            project_path,
            should_quit: false,
            song,
            mode: AppMode::default(),
            view_mode: ViewMode::default(),
            show_browser: true,
            transport: Transport::new(),
            cursors: Cursors::default(),
            vim: VimStates::new(num_channels),
            registers: RegisterFile::new(),
            journal: Journal::new(),
            jumplist: Jumplist::new(),
            browser: BrowserState::new(samples_path),
            autosave: Autosave::new(),
            event_log: EventLog::new(),
            audio,
            terminal_width: 80,
            terminal_height: 24,
            is_previewing: false,
            pending_note: None,
            text_input: Input::default(),
        };

        if created {
            // Write the fresh project so the samples/ directory exists;
            // a failure here is non-fatal (autosave will retry)
            if let Err(e) = app.save_project() {
                app.event_log.error(format!("failed to create project: {e}"));
            }
            app.browser.refresh();
        }

        Ok(app)
    }

    /// Test constructor: fresh default song, capture audio, temp-less path
    #[cfg(test)]
    pub fn new_for_test() -> Self {
        let song = Song::new("test");
        let num_channels = song.channels.len();
        Self {
            project_name: "test".to_string(),
            project_path: PathBuf::from("test"),
            should_quit: false,
            song,
            mode: AppMode::default(),
            view_mode: ViewMode::default(),
            show_browser: false,
            transport: Transport::new(),
            cursors: Cursors::default(),
            vim: VimStates::new(num_channels),
            registers: RegisterFile::new(),
            journal: Journal::new(),
            jumplist: Jumplist::new(),
            browser: BrowserState::new(PathBuf::from("test/samples")),
            autosave: Autosave::new(),
            event_log: EventLog::new(),
            audio: AudioHandle::capture(),
            terminal_width: 80,
            terminal_height: 24,
            is_previewing: false,
            pending_note: None,
            text_input: Input::default(),
        }
    }

    pub fn samples_root(&self) -> PathBuf {
        project::samples_dir(&self.project_path)
    }

    pub fn on_resize(&mut self, width: u16, height: u16) {
        self.terminal_width = width;
        self.terminal_height = height;
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Dispatch a command: journaled edits go through the journal with a
    /// cursor snapshot; transport and pattern selection apply directly.
    pub fn dispatch(&mut self, cmd: AppCommand) {
        self.event_log.info(cmd.description());

        match lower_edit(&cmd) {
            Some(op) => {
                let snapshot = self.cursor_snapshot();
                self.journal
                    .execute(Command::with_cursor(op, snapshot), &mut self.song);
                self.autosave.mark_dirty();
            }
            None => self.apply_direct(cmd),
        }
    }

    /// Dispatch several edits as one undo unit
    pub fn dispatch_batch(&mut self, description: &str, cmds: Vec<AppCommand>) {
        let ops: Vec<EditOp> = cmds.iter().filter_map(lower_edit).collect();
        if ops.is_empty() {
            return;
        }
        self.event_log.info(description.to_string());
        let snapshot = self.cursor_snapshot();
        self.journal
            .batch(description, &mut self.song, move |journal, song| {
                for op in ops {
                    journal.execute(Command::with_cursor(op, snapshot), song);
                }
            });
        self.autosave.mark_dirty();
    }

    fn apply_direct(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::TogglePlayback => self.toggle_playback(),
            AppCommand::StopPlayback => self.stop_playback(),
            AppCommand::PreviousPattern => {
                let ids = self.pattern_ids();
                if let Some(pos) = ids.iter().position(|&id| id == self.song.current_pattern_id)
                {
                    if pos > 0 {
                        self.song.switch_to_pattern(ids[pos - 1]);
                        self.autosave.mark_dirty();
                    }
                }
            }
            AppCommand::NextPattern => {
                let ids = self.pattern_ids();
                match ids.iter().position(|&id| id == self.song.current_pattern_id) {
                    Some(pos) if pos + 1 < ids.len() => {
                        self.song.switch_to_pattern(ids[pos + 1]);
                    }
                    _ => {
                        // At the end: create the next pattern
                        self.song.create_pattern();
                    }
                }
                self.autosave.mark_dirty();
            }
            AppCommand::CreatePattern => {
                self.song.create_pattern();
                self.autosave.mark_dirty();
            }
            AppCommand::SwitchPattern(id) => {
                self.song.switch_to_pattern(id);
                self.autosave.mark_dirty();
            }
            // Journaled commands never reach here (lower_edit is Some)
            _ => {}
        }
    }

    fn pattern_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.song.patterns.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub fn toggle_playback(&mut self) {
        if self.transport.playing {
            self.stop_playback();
        } else {
            let samples_root = self.samples_root();
            if self.mode.current_panel() == Panel::Playlist {
                let bar = self.cursors.playlist.bar().unwrap_or(0);
                self.transport
                    .start_arrangement_from(bar, &self.song, &samples_root, &self.audio);
            } else {
                self.transport
                    .start(TransportMode::Pattern, &self.song, &samples_root, &self.audio);
            }
        }
    }

    pub fn stop_playback(&mut self) {
        self.transport.stop();
        self.audio.stop_all();
    }

    /// Called every frame: advance the transport and poll autosave
    pub fn tick(&mut self, delta: Duration) {
        let samples_root = self.samples_root();
        self.transport
            .tick(delta, &self.song, &samples_root, &self.audio);
        self.maybe_autosave();
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn save_project(&self) -> Result<(), ProjectError> {
        let file = ProjectFile::from_song(&self.song);
        project::save_project(&self.project_path, &file)
    }

    /// Debounced autosave; failures are surfaced as non-fatal log entries
    /// and retried after the next mutation.
    pub fn maybe_autosave(&mut self) {
        let song = &self.song;
        let path = &self.project_path;
        let result = self
            .autosave
            .flush_if_due(|| project::save_project(path, &ProjectFile::from_song(song)));
        if let Some(Err(e)) = result {
            self.event_log.error(format!("autosave failed: {e}"));
        }
    }

    /// Shutdown path: flush any pending save, stop transport and audio
    pub fn shutdown(&mut self) {
        let song = &self.song;
        let path = &self.project_path;
        let result = self
            .autosave
            .flush(|| project::save_project(path, &ProjectFile::from_song(song)));
        if let Some(Err(e)) = result {
            self.event_log.error(format!("final save failed: {e}"));
        }
        self.transport.stop();
        self.audio.stop_all();
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    pub fn undo(&mut self) {
        let outcome = self.journal.undo(&mut self.song);
        if outcome.success {
            self.autosave.mark_dirty();
            if let Some(snapshot) = outcome.cursor {
                self.restore_cursor(snapshot);
            }
        }
    }

    pub fn redo(&mut self) {
        let outcome = self.journal.redo(&mut self.song);
        if outcome.success {
            self.autosave.mark_dirty();
            if let Some(snapshot) = outcome.cursor {
                self.restore_cursor(snapshot);
            }
        }
    }

    /// Current cursor as a journal snapshot (vim-space coordinates)
    pub fn cursor_snapshot(&self) -> CursorSnapshot {
        let position = match self.view_mode {
            ViewMode::ChannelRack => Position::new(
                self.cursors.channel_rack.channel,
                VimCol::from(self.cursors.channel_rack.col).0,
            ),
            ViewMode::PianoRoll => Position::new(
                MidiPitch(self.cursors.piano_roll.pitch).to_piano_row(),
                self.cursors.piano_roll.step,
            ),
            ViewMode::Playlist => {
                Position::new(self.cursors.playlist.row, self.cursors.playlist.col)
            }
        };
        CursorSnapshot {
            view: self.view_mode,
            position,
        }
    }

    /// Put the cursor (and view) back to a snapshot
    pub fn restore_cursor(&mut self, snapshot: CursorSnapshot) {
        self.view_mode = snapshot.view;
        self.mode.switch_panel(snapshot.view.panel());
        let pos = snapshot.position;
        match snapshot.view {
            ViewMode::ChannelRack => {
                self.cursors.channel_rack.channel =
                    pos.row.min(self.song.channels.len().saturating_sub(1));
                self.cursors.channel_rack.col = AppCol::from(VimCol(pos.col)).clamp();
            }
            ViewMode::PianoRoll => {
                self.cursors.piano_roll.pitch = MidiPitch::from_piano_row(pos.row).clamp_piano().0;
                self.cursors.piano_roll.step = pos.col.min(NUM_STEPS - 1);
            }
            ViewMode::Playlist => {
                self.cursors.playlist.row = pos.row;
                self.cursors.playlist.col = pos.col.min(16);
            }
        }
    }

    // ========================================================================
    // Jumplist
    // ========================================================================

    pub fn current_jump_position(&self) -> JumpPosition {
        let snapshot = self.cursor_snapshot();
        JumpPosition::new(snapshot.view, snapshot.position.row, snapshot.position.col)
    }

    pub fn push_jump(&mut self) {
        let current = self.current_jump_position();
        self.jumplist.push(current);
    }

    pub fn jump_back(&mut self) {
        let current = self.current_jump_position();
        if let Some(pos) = self.jumplist.back(current) {
            self.restore_cursor(CursorSnapshot {
                view: pos.view,
                position: Position::new(pos.row, pos.col),
            });
        }
    }

    pub fn jump_forward(&mut self) {
        if let Some(pos) = self.jumplist.forward() {
            self.restore_cursor(CursorSnapshot {
                view: pos.view,
                position: Position::new(pos.row, pos.col),
            });
        }
    }

    // ========================================================================
    // Views and panels
    // ========================================================================

    /// Switch the main view, recording the jump for Ctrl+O
    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        if self.view_mode != view_mode {
            self.push_jump();
        }
        self.view_mode = view_mode;
        self.mode.switch_panel(view_mode.panel());
    }

    pub fn next_panel(&mut self) {
        self.mode.next_panel(self.show_browser, self.view_mode);
    }

    pub fn toggle_browser(&mut self) {
        self.show_browser = !self.show_browser;
        if self.show_browser {
            self.push_jump();
            self.mode.switch_panel(Panel::Browser);
        } else if self.mode.current_panel() == Panel::Browser {
            self.mode.switch_panel(self.view_mode.panel());
        }
    }

    // ========================================================================
    // Previews
    // ========================================================================

    /// Preview a channel's sound (hold 's' in the channel rack)
    pub fn start_channel_preview(&mut self, channel: usize) {
        let Some(ch) = self.song.channels.get(channel) else {
            return;
        };
        match ch.kind {
            ChannelKind::Sample => {
                if ch.sample_ref.is_empty() {
                    return;
                }
                let path = self.samples_root().join(&ch.sample_ref);
                self.audio.preview_sample(&path);
            }
            ChannelKind::Synth => {
                self.audio.preview_synth(&ch.synth_patch, 60);
            }
        }
        self.is_previewing = true;
    }

    /// Preview a pitch on the piano roll's channel
    pub fn preview_pitch(&mut self, pitch: u8) {
        let channel = self.cursors.channel_rack.channel;
        let Some(ch) = self.song.channels.get(channel) else {
            return;
        };
        match ch.kind {
            ChannelKind::Sample => {
                if ch.sample_ref.is_empty() {
                    return;
                }
                let path = self.samples_root().join(&ch.sample_ref);
                self.audio.preview_sample_pitched(&path, pitch);
            }
            ChannelKind::Synth => {
                self.audio.preview_synth(&ch.synth_patch, pitch);
            }
        }
        self.is_previewing = true;
    }

    pub fn stop_preview(&mut self) {
        if self.is_previewing {
            self.audio.stop_preview();
            self.is_previewing = false;
        }
    }

    // ========================================================================
    // Text input (tempo / rename)
    // ========================================================================

    pub fn start_text_input(&mut self, target: InputTarget) {
        let initial = match &target {
            InputTarget::Tempo => format!("{:.0}", self.song.bpm),
            InputTarget::ChannelRename { channel } => self
                .song
                .channels
                .get(*channel)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
        };
        self.text_input = Input::from(initial);
        self.mode.start_text_input(target);
    }

    /// Apply a confirmed text input
    pub fn commit_text_input(&mut self) {
        let AppMode::TextInput { target, .. } = self.mode.clone() else {
            return;
        };
        let value = self.text_input.value().to_string();
        match target {
            InputTarget::Tempo => {
                if let Ok(bpm) = value.parse::<f64>() {
                    self.dispatch(AppCommand::SetBpm(bpm));
                }
            }
            InputTarget::ChannelRename { channel } => {
                if !value.is_empty() {
                    if let Some(ch) = self.song.channels.get_mut(channel) {
                        ch.name = value;
                        self.autosave.mark_dirty();
                    }
                }
            }
        }
        self.mode.close_modal();
    }
}

/// Lower an `AppCommand` onto its journal edit, or None for commands that
/// apply directly (transport, pattern selection)
fn lower_edit(cmd: &AppCommand) -> Option<EditOp> {
    let op = match cmd.clone() {
        AppCommand::SetBpm(bpm) => EditOp::SetBpm { bpm, prior: None },
        AppCommand::ToggleStep {
            pattern,
            channel,
            step,
        } => EditOp::ToggleStep {
            pattern_id: pattern,
            channel,
            step,
            was_on: None,
        },
        AppCommand::SetSteps {
            pattern,
            channel,
            start,
            values,
        } => EditOp::SetSteps {
            pattern_id: pattern,
            channel,
            start,
            values,
            prior: None,
        },
        AppCommand::ClearStepRange {
            pattern,
            channel,
            start,
            end,
        } => EditOp::ClearStepRange {
            pattern_id: pattern,
            channel,
            start,
            end,
            prior: None,
        },
        AppCommand::ClearChannel { pattern, channel } => EditOp::ClearChannel {
            pattern_id: pattern,
            channel,
            prior: None,
        },
        AppCommand::ToggleMute(channel) => EditOp::ToggleMute {
            channel,
            was_muted: None,
        },
        AppCommand::CycleChannelMuteState(channel) => EditOp::CycleMuteState {
            channel,
            prior: None,
        },
        AppCommand::SetChannelSample { channel, path } => EditOp::SetChannelSample {
            channel,
            path,
            prior: None,
        },
        AppCommand::AddNote {
            pattern,
            channel,
            pitch,
            start_step,
            duration,
        } => EditOp::AddNote {
            pattern_id: pattern,
            channel,
            pitch,
            start_step,
            duration,
            note: None,
        },
        AppCommand::RemoveNote {
            pattern,
            channel,
            note_id,
        } => EditOp::RemoveNote {
            pattern_id: pattern,
            channel,
            note_id,
            removed: None,
        },
        AppCommand::UpdateNote {
            pattern,
            channel,
            note_id,
            change,
        } => EditOp::UpdateNote {
            pattern_id: pattern,
            channel,
            note_id,
            change,
            prior: None,
        },
        AppCommand::ToggleNote {
            pattern,
            channel,
            pitch,
            start_step,
            duration,
        } => EditOp::ToggleNote {
            pattern_id: pattern,
            channel,
            pitch,
            start_step,
            duration,
            fired: None,
        },
        AppCommand::TogglePlacement { pattern_id, bar } => EditOp::TogglePlacement {
            pattern_id,
            bar,
            fired: None,
        },
        AppCommand::AddPlacements { positions } => EditOp::AddPlacements {
            positions,
            added: None,
        },
        AppCommand::RemovePlacements {
            pattern_id,
            start_bar,
            end_bar,
        } => EditOp::RemovePlacements {
            pattern_id,
            start_bar,
            end_bar,
            removed: None,
        },
        AppCommand::TogglePatternMute(pattern_id) => EditOp::TogglePatternMute { pattern_id },
        AppCommand::TogglePlayback
        | AppCommand::StopPlayback
        | AppCommand::PreviousPattern
        | AppCommand::NextPattern
        | AppCommand::CreatePattern
        | AppCommand::SwitchPattern(_) => return None,
    };
    Some(op)
}

// ============================================================================
// Context trait implementations
// ============================================================================

impl StepGridContext for App {
    fn channel_count(&self) -> usize {
        self.song.channels.len()
    }

    fn get_step(&self, channel: usize, step: usize) -> bool {
        self.song
            .current_pattern()
            .map(|p| p.get_step(channel, step))
            .unwrap_or(false)
    }
}

impl PianoRollContext for App {
    fn notes(&self) -> &[Note] {
        let channel = self.cursors.channel_rack.channel;
        self.song
            .current_pattern()
            .map(|p| p.notes(channel))
            .unwrap_or(&[])
    }
}

impl PlaylistContext for App {
    fn pattern_row_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .song
            .non_empty_patterns()
            .iter()
            .map(|p| p.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn has_placement(&self, pattern_id: usize, bar: usize) -> bool {
        self.song.arrangement.has_placement(pattern_id, bar)
    }
}

/// A channel's step row as vim-space content for w/b/e word motions.
/// Metadata columns (mute, name) carry no content.
pub fn channel_rack_row_content(app: &App, channel: usize) -> Vec<bool> {
    let mut content = vec![false; VimCol::COUNT];
    if let Some(pattern) = app.song.current_pattern() {
        for step in 0..NUM_STEPS {
            content[VimCol::FIRST_STEP.0 + step] = pattern.get_step(channel, step);
        }
    }
    content
}

/// A pitch row's note coverage as content for piano roll word motions
pub fn piano_roll_row_content(app: &App, pitch: u8) -> Vec<bool> {
    let channel = app.cursors.channel_rack.channel;
    let mut content = vec![false; NUM_STEPS];
    if let Some(pattern) = app.song.current_pattern() {
        for note in pattern.notes(channel) {
            if note.pitch == pitch {
                for step in note.start_step..(note.start_step + note.duration).min(NUM_STEPS) {
                    content[step] = true;
                }
            }
        }
    }
    content
}
