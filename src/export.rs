// Local mirror of a Pocket list.
//
// Every item is sorted into several overlapping folders (status, read
// state, video, size and date, plus `all`) and gets one `.url` shortcut in
// each of them. Without a usable output directory the same classification
// is printed instead. Either way a per-folder tally is reported at the end.

use crate::error::{PocketError, Result};
use crate::item::Item;
use crate::ui;
use chrono::DateTime;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Folder every item lands in.
pub const ALL: &str = "all";

/// Longest sanitized title kept in a shortcut file name.
pub const MAX_TITLE_LEN: usize = 231;

/// Where an item sits in the user's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    List,
    Archived,
    ToBeDeleted,
}

impl ItemStatus {
    pub fn from_code(item_id: &str, code: i64) -> Result<Self> {
        match code {
            0 => Ok(ItemStatus::List),
            1 => Ok(ItemStatus::Archived),
            2 => Ok(ItemStatus::ToBeDeleted),
            value => Err(PocketError::UnknownStatus {
                item_id: item_id.to_string(),
                value,
            }),
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            ItemStatus::List => "list",
            ItemStatus::Archived => "archived",
            ItemStatus::ToBeDeleted => "to_be_deleted",
        }
    }
}

/// Length bucket by word count. Each bound is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    Tiny,
    Small,
    Short,
    Normal,
    Large,
    Huge,
}

impl SizeTier {
    pub fn from_word_count(words: u64) -> Self {
        match words {
            0..=499 => SizeTier::Tiny,
            500..=1999 => SizeTier::Small,
            2000..=4999 => SizeTier::Short,
            5000..=9999 => SizeTier::Normal,
            10000..=14999 => SizeTier::Large,
            _ => SizeTier::Huge,
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            SizeTier::Tiny => "tiny",
            SizeTier::Small => "small",
            SizeTier::Short => "short",
            SizeTier::Normal => "normal",
            SizeTier::Large => "large",
            SizeTier::Huge => "huge",
        }
    }
}

fn read_state(item: &Item) -> &'static str {
    if item.time_read == 0 {
        "unread"
    } else {
        "read"
    }
}

fn video_folder(item: &Item) -> Result<Option<&'static str>> {
    match item.has_video {
        0 => Ok(None),
        1 => Ok(Some("has_video")),
        2 => Ok(Some("is_video")),
        value => Err(PocketError::UnknownVideoFlag {
            item_id: item.item_id.clone(),
            value,
        }),
    }
}

/// `by_date/{year}/{month}` from `time_added`, in UTC.
fn date_folder(item: &Item) -> Result<String> {
    let added = DateTime::from_timestamp(item.time_added, 0).ok_or_else(|| {
        PocketError::InvalidTimestamp {
            item_id: item.item_id.clone(),
            value: item.time_added,
        }
    })?;
    Ok(format!(
        "by_date/{}/{}",
        added.format("%Y"),
        added.format("%B").to_string().to_lowercase()
    ))
}

/// All folders `item` belongs in, `all` first.
///
/// Unknown `status` or `has_video` codes are an error rather than a
/// silently missing folder.
pub fn folders_for(item: &Item) -> Result<Vec<String>> {
    let mut folders = vec![
        ALL.to_string(),
        ItemStatus::from_code(&item.item_id, item.status)?
            .dir_name()
            .to_string(),
        read_state(item).to_string(),
    ];
    if let Some(video) = video_folder(item)? {
        folders.push(video.to_string());
    }
    folders.push(SizeTier::from_word_count(item.word_count).dir_name().to_string());
    folders.push(date_folder(item)?);
    Ok(folders)
}

/// Replace every non-letter with `_`, trim underscores from both ends and
/// cap the length at [`MAX_TITLE_LEN`] characters.
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if c.is_alphabetic() { c } else { '_' })
        .collect();
    replaced.trim_matches('_').chars().take(MAX_TITLE_LEN).collect()
}

pub fn shortcut_file_name(item: &Item) -> String {
    format!("{} - {}.url", item.item_id, sanitize_title(item.title()))
}

/// Contents of an internet shortcut pointing at `url`.
pub fn shortcut_contents(url: &str) -> String {
    format!("[InternetShortcut]\nURL={}\n", url)
}

/// Per-folder item counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTally {
    counts: HashMap<String, usize>,
}

impl CategoryTally {
    pub fn record(&mut self, folder: &str) {
        *self.counts.entry(folder.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, folder: &str) -> usize {
        self.counts.get(folder).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.count(ALL)
    }

    /// Folders by descending count, ties broken by name.
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut rows: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    /// Percentage of all items that landed in `folder`.
    pub fn percent(&self, folder: &str) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(folder) as f64 * 100.0 / total as f64,
        }
    }

    pub fn write_report<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "Items per category:")?;
        for (folder, count) in self.sorted() {
            writeln!(out, "{:>7} {:>6.2}%  {}", count, self.percent(folder), folder)?;
        }
        Ok(())
    }
}

/// Runs the categorization over a batch of items.
#[derive(Debug, Clone)]
pub struct LocalExport {
    target: Option<PathBuf>,
}

impl LocalExport {
    /// Write shortcuts under `output_dir` if it is a writable directory.
    /// Otherwise fall back to printing the classification, with a warning.
    pub fn new(output_dir: Option<&Path>) -> Self {
        let target = match output_dir {
            Some(dir) if is_writable_dir(dir) => Some(dir.to_path_buf()),
            Some(dir) => {
                warn!(path = %dir.display(), "output directory is not writable");
                ui::warning(&format!(
                    "{} is not a writable directory; only listing categories.",
                    dir.display()
                ));
                None
            }
            None => None,
        };
        LocalExport { target }
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn is_dry_run(&self) -> bool {
        self.target.is_none()
    }

    /// Classify every item, write shortcuts (or dry-run lines to `out`) and
    /// return the tally. Filesystem errors abort the run.
    pub fn run<W: Write>(&self, items: &[Item], out: &mut W) -> Result<CategoryTally> {
        let mut tally = CategoryTally::default();

        for item in items {
            let folders = folders_for(item)?;
            for folder in &folders {
                tally.record(folder);
            }

            match &self.target {
                Some(root) => write_shortcuts(root, item, &folders)?,
                None => writeln!(out, "{} {}: {}", item.item_id, item.title(), folders.join(", "))
                    .map_err(|e| PocketError::io("write to", "stdout", e))?,
            }
        }

        Ok(tally)
    }
}

fn write_shortcuts(root: &Path, item: &Item, folders: &[String]) -> Result<()> {
    let file_name = shortcut_file_name(item);
    let contents = shortcut_contents(&item.read_url());

    for folder in folders {
        let dir = folder.split('/').fold(root.to_path_buf(), |dir, part| dir.join(part));
        fs::create_dir_all(&dir).map_err(|e| PocketError::io("create directory", &dir, e))?;

        let path = dir.join(&file_name);
        debug!(path = %path.display(), "writing shortcut");
        fs::write(&path, &contents).map_err(|e| PocketError::io("write", &path, e))?;
    }
    Ok(())
}

// Permission bits miss read-only mounts and directories owned by someone
// else, so try an actual write. The temp file is removed on drop.
fn is_writable_dir(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    match tempfile::tempfile_in(path) {
        Ok(_) => true,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "write check failed");
            false
        }
    }
}
