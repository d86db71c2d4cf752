//! Sample browser: a tree over the project's samples directory.
//!
//! - Directory tree with expand/collapse (h/l are custom motions here)
//! - Folders sort before files, then lexicographic by name
//! - Hidden entries (leading dot) are excluded
//! - Only .wav/.mp3/.flac files are listed

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// A file or directory entry in the browser
#[derive(Debug, Clone)]
pub struct BrowserEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub depth: usize,
}

/// Browser state
#[derive(Debug, Clone)]
pub struct BrowserState {
    /// Root path for sample browsing
    pub samples_path: PathBuf,
    /// All entries in tree order
    all_entries: Vec<BrowserEntry>,
    /// Currently visible entries (respecting expand/collapse)
    pub visible_entries: Vec<BrowserEntry>,
    /// Cursor position in visible entries
    pub cursor: usize,
    /// Expanded directory paths
    pub expanded: HashSet<PathBuf>,
}

impl BrowserState {
    pub fn new(samples_path: PathBuf) -> Self {
        let mut state = Self {
            samples_path,
            all_entries: Vec::new(),
            visible_entries: Vec::new(),
            cursor: 0,
            expanded: HashSet::new(),
        };
        state.refresh();
        state
    }

    /// Rescan the samples directory
    pub fn refresh(&mut self) {
        self.scan_directory();
        self.update_visible_entries();
    }

    fn scan_directory(&mut self) {
        self.all_entries.clear();

        let root = self.samples_path.clone();
        if !root.exists() {
            return;
        }

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .sort_by(compare_entries)
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path().to_path_buf();
            let is_dir = entry.file_type().is_dir();

            if !is_dir && !is_audio_file(&path) {
                continue;
            }

            let depth = entry.depth() - 1;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            self.all_entries.push(BrowserEntry {
                path,
                name,
                is_dir,
                depth,
            });
        }
    }

    /// Rebuild the visible list from the expansion state
    pub fn update_visible_entries(&mut self) {
        self.visible_entries.clear();

        let root = self.samples_path.clone();
        for entry in &self.all_entries {
            let mut visible = true;
            let mut current = entry.path.parent();

            while let Some(parent) = current {
                if parent == root {
                    break;
                }
                if !self.expanded.contains(parent) {
                    visible = false;
                    break;
                }
                current = parent.parent();
            }
            if visible {
                self.visible_entries.push(entry.clone());
            }
        }

        if !self.visible_entries.is_empty() {
            self.cursor = self.cursor.min(self.visible_entries.len() - 1);
        } else {
            self.cursor = 0;
        }
    }

    pub fn current_entry(&self) -> Option<&BrowserEntry> {
        self.visible_entries.get(self.cursor)
    }

    pub fn move_down(&mut self, count: usize) {
        if !self.visible_entries.is_empty() {
            self.cursor = (self.cursor + count).min(self.visible_entries.len() - 1);
        }
    }

    pub fn move_up(&mut self, count: usize) {
        self.cursor = self.cursor.saturating_sub(count);
    }

    pub fn go_to_row(&mut self, row: usize) {
        if !self.visible_entries.is_empty() {
            self.cursor = row.min(self.visible_entries.len() - 1);
        }
    }

    /// Toggle folder expansion, or return the selected file's path
    pub fn toggle_or_select(&mut self) -> Option<PathBuf> {
        let entry = self.current_entry().cloned()?;
        if entry.is_dir {
            if !self.expanded.remove(&entry.path) {
                self.expanded.insert(entry.path);
            }
            self.update_visible_entries();
            None
        } else {
            Some(entry.path)
        }
    }

    /// Expand the current folder ('l' custom motion)
    pub fn expand(&mut self) {
        if let Some(entry) = self.current_entry() {
            if entry.is_dir && !self.expanded.contains(&entry.path) {
                self.expanded.insert(entry.path.clone());
                self.update_visible_entries();
            }
        }
    }

    /// Collapse the current folder or jump to its parent ('h' custom motion)
    pub fn collapse_or_parent(&mut self) {
        let root = self.samples_path.clone();
        let Some(entry) = self.current_entry().cloned() else {
            return;
        };

        if entry.is_dir && self.expanded.contains(&entry.path) {
            self.expanded.remove(&entry.path);
            self.update_visible_entries();
        } else if let Some(parent) = entry.path.parent() {
            if parent != root {
                if let Some(idx) = self.visible_entries.iter().position(|e| e.path == parent) {
                    self.cursor = idx;
                }
            }
        }
    }

    /// The selected file's path relative to the samples root
    pub fn selected_relative_path(&self) -> Option<String> {
        let entry = self.current_entry()?;
        if entry.is_dir {
            return None;
        }
        entry
            .path
            .strip_prefix(&self.samples_path)
            .ok()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// The selected file's full path (for previews)
    pub fn selected_file_path(&self) -> Option<PathBuf> {
        let entry = self.current_entry()?;
        if entry.is_dir {
            None
        } else {
            Some(entry.path.clone())
        }
    }
}

/// Folders before files, then lexicographic by name
fn compare_entries(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    b_dir
        .cmp(&a_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Check if a file is a supported audio format
fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "wav" | "mp3" | "flac"))
        .unwrap_or(false)
}
