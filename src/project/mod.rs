//! Project persistence: the versioned value tree and atomic save/load.
//!
//! Project layout on disk:
//! - `project.json` at the project root
//! - `samples/` directory scanned by the browser

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::song::arrangement::PatternPlacement;
use crate::song::synth::SynthPatch;
use crate::song::{Arrangement, Channel, ChannelKind, Note, Pattern, Song};

/// Current project file version
pub const PROJECT_VERSION: u32 = 1;

/// Project file name
pub const PROJECT_FILE_NAME: &str = "project.json";

/// Serializable project file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: u32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub bpm: f64,
    pub current_pattern_id: usize,
    pub channels: Vec<ChannelData>,
    pub patterns: Vec<PatternData>,
    #[serde(default)]
    pub arrangement: ArrangementData,
}

/// Serializable channel data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelData {
    pub name: String,
    #[serde(default)]
    pub kind: ChannelKind,
    #[serde(default)]
    pub sample_ref: String,
    #[serde(default)]
    pub synth_patch: SynthPatch,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub solo: bool,
    #[serde(default = "default_volume")]
    pub volume: u8,
}

fn default_volume() -> u8 {
    80
}

/// Serializable pattern data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternData {
    pub id: usize,
    pub name: String,
    pub steps: Vec<Vec<bool>>,
    #[serde(default)]
    pub notes: Vec<Vec<NoteData>>,
}

/// Serializable note data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteData {
    pub id: String,
    pub pitch: u8,
    pub start_step: usize,
    pub duration: usize,
}

/// Serializable placement data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementData {
    pub id: String,
    pub pattern_id: usize,
    pub start_bar: usize,
    pub length: usize,
}

/// Serializable arrangement. The in-memory muted set is persisted as a
/// sorted array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArrangementData {
    #[serde(default)]
    pub placements: Vec<PlacementData>,
    #[serde(default)]
    pub muted_patterns: Vec<usize>,
}

impl ProjectFile {
    /// Snapshot the model into the value tree
    pub fn from_song(song: &Song) -> Self {
        let mut muted_patterns: Vec<usize> =
            song.arrangement.muted_patterns.iter().copied().collect();
        muted_patterns.sort_unstable();

        Self {
            version: PROJECT_VERSION,
            name: song.name.clone(),
            created_at: song.created_at,
            modified_at: Utc::now(),
            bpm: song.bpm,
            current_pattern_id: song.current_pattern_id,
            channels: song.channels.iter().map(ChannelData::from).collect(),
            patterns: song.patterns.iter().map(PatternData::from).collect(),
            arrangement: ArrangementData {
                placements: song
                    .arrangement
                    .placements
                    .iter()
                    .map(PlacementData::from)
                    .collect(),
                muted_patterns,
            },
        }
    }

    /// Rebuild the model from the value tree
    pub fn into_song(self) -> Song {
        let channels: Vec<Channel> = self.channels.iter().map(Channel::from).collect();
        let num_channels = channels.len();

        let mut song = Song {
            name: self.name,
            created_at: self.created_at,
            bpm: self.bpm,
            channels,
            patterns: self
                .patterns
                .iter()
                .map(|p| p.to_pattern(num_channels))
                .collect(),
            current_pattern_id: self.current_pattern_id,
            arrangement: Arrangement {
                placements: self
                    .arrangement
                    .placements
                    .iter()
                    .map(PatternPlacement::from)
                    .collect(),
                muted_patterns: self.arrangement.muted_patterns.into_iter().collect(),
            },
        };

        // current_pattern_id must always name an existing pattern
        if song.patterns.is_empty() {
            song.patterns.push(Pattern::new(0, num_channels));
            song.current_pattern_id = 0;
        } else if song.pattern(song.current_pattern_id).is_none() {
            song.current_pattern_id = song.patterns[0].id;
        }

        song
    }
}

impl From<&Channel> for ChannelData {
    fn from(channel: &Channel) -> Self {
        Self {
            name: channel.name.clone(),
            kind: channel.kind,
            sample_ref: channel.sample_ref.clone(),
            synth_patch: channel.synth_patch.clone(),
            muted: channel.muted,
            solo: channel.solo,
            volume: channel.volume,
        }
    }
}

impl From<&ChannelData> for Channel {
    fn from(data: &ChannelData) -> Self {
        Self {
            name: data.name.clone(),
            kind: data.kind,
            sample_ref: data.sample_ref.clone(),
            synth_patch: data.synth_patch.clone(),
            muted: data.muted,
            solo: data.solo,
            volume: data.volume.min(100),
        }
    }
}

impl From<&Pattern> for PatternData {
    fn from(pattern: &Pattern) -> Self {
        Self {
            id: pattern.id,
            name: pattern.name.clone(),
            steps: pattern.steps.clone(),
            notes: pattern
                .notes
                .iter()
                .map(|channel_notes| channel_notes.iter().map(NoteData::from).collect())
                .collect(),
        }
    }
}

impl PatternData {
    /// Rebuild a pattern, padding the note lists to the channel count
    /// (older files may not have notes at all)
    fn to_pattern(&self, num_channels: usize) -> Pattern {
        let notes = if self.notes.len() == num_channels {
            self.notes
                .iter()
                .map(|channel_notes| channel_notes.iter().map(Note::from).collect())
                .collect()
        } else {
            vec![Vec::new(); num_channels]
        };

        Pattern {
            id: self.id,
            name: self.name.clone(),
            steps: self.steps.clone(),
            notes,
        }
    }
}

impl From<&Note> for NoteData {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.clone(),
            pitch: note.pitch,
            start_step: note.start_step,
            duration: note.duration,
        }
    }
}

impl From<&NoteData> for Note {
    fn from(data: &NoteData) -> Self {
        Self {
            id: data.id.clone(),
            pitch: data.pitch,
            start_step: data.start_step,
            duration: data.duration,
        }
    }
}

impl From<&PatternPlacement> for PlacementData {
    fn from(placement: &PatternPlacement) -> Self {
        Self {
            id: placement.id.clone(),
            pattern_id: placement.pattern_id,
            start_bar: placement.start_bar,
            length: placement.length,
        }
    }
}

impl From<&PlacementData> for PatternPlacement {
    fn from(data: &PlacementData) -> Self {
        Self {
            id: data.id.clone(),
            pattern_id: data.pattern_id,
            start_bar: data.start_bar,
            length: data.length,
        }
    }
}

/// Project-related errors
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("project not found: {0}")]
    NotFound(String),
    #[error("unsupported project version: {0}")]
    UnsupportedVersion(u32),
}

/// Check if a directory contains a valid project
pub fn is_valid_project(path: &Path) -> bool {
    path.join(PROJECT_FILE_NAME).exists()
}

/// The project's samples root
pub fn samples_dir(path: &Path) -> PathBuf {
    path.join("samples")
}

/// Load a project from disk.
///
/// A file with a version greater than ours is rejected; persistence never
/// guesses at unknown formats.
pub fn load_project(path: &Path) -> Result<ProjectFile, ProjectError> {
    let project_file = path.join(PROJECT_FILE_NAME);
    if !project_file.exists() {
        return Err(ProjectError::NotFound(path.display().to_string()));
    }

    let json = fs::read_to_string(&project_file)?;
    let project: ProjectFile = serde_json::from_str(&json)?;

    if project.version > PROJECT_VERSION {
        return Err(ProjectError::UnsupportedVersion(project.version));
    }

    Ok(project)
}

/// Save a project to disk (atomic write: temp file then rename)
pub fn save_project(path: &Path, project: &ProjectFile) -> Result<(), ProjectError> {
    fs::create_dir_all(path)?;
    fs::create_dir_all(samples_dir(path))?;

    let project_file = path.join(PROJECT_FILE_NAME);
    let temp_file = path.join(format!(".{}.tmp", PROJECT_FILE_NAME));

    let json = serde_json::to_string_pretty(project)?;
    fs::write(&temp_file, &json)?;
    fs::rename(&temp_file, &project_file)?;

    Ok(())
}
