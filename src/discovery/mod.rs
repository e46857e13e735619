//! Media file discovery.
//!
//! Walks an input tree and yields one [`MediaJob`] per accepted media file,
//! recording where it sits relative to the root so output trees can mirror it.

use crate::error::{Result, VidlearnError};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One input media file scheduled for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaJob {
    /// Absolute or root-joined path to the source file.
    pub source_path: PathBuf,
    /// Directory of the file relative to the input root (empty at top level).
    pub relative_subdir: PathBuf,
    /// File name including extension.
    pub filename: String,
    /// Lowercased extension without the dot.
    pub extension: String,
    /// Stem used to name this job's outputs.
    output_stem: String,
}

impl MediaJob {
    /// Build a job for `path` found under `root`.
    pub fn from_path(root: &Path, path: &Path) -> Option<Self> {
        let filename = path.file_name()?.to_str()?.to_string();
        let extension = path.extension()?.to_str()?.to_lowercase();
        let relative_subdir = path
            .parent()
            .and_then(|parent| parent.strip_prefix(root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let output_stem = Path::new(&filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&filename)
            .to_string();

        Some(Self {
            source_path: path.to_path_buf(),
            relative_subdir,
            filename,
            extension,
            output_stem,
        })
    }

    /// File name without its extension.
    pub fn base_name(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.filename)
    }

    /// Stem for the transcript and article names.
    ///
    /// Equal to [`base_name`](Self::base_name) unless another media file in
    /// the same directory shares the stem, in which case the extension is
    /// appended (`talk_mp4`).
    pub fn output_name(&self) -> &str {
        &self.output_stem
    }

    fn disambiguate(&mut self) {
        self.output_stem = format!("{}_{}", self.base_name(), self.extension);
    }

    /// The job's path relative to the input root, for log lines.
    pub fn display_name(&self) -> String {
        self.relative_subdir.join(&self.filename).display().to_string()
    }
}

/// Lazy, depth-first walk over an input tree.
///
/// Entries are visited in name order within each directory so repeated runs
/// over the same tree see jobs in the same order.
pub struct Discovery {
    root: PathBuf,
    extensions: Vec<String>,
    excluded: Vec<PathBuf>,
    pending_dirs: Vec<PathBuf>,
    pending_jobs: VecDeque<MediaJob>,
}

impl Discovery {
    /// Start a walk at `root`, accepting files whose extension (case-insensitive)
    /// is in `extensions`.
    ///
    /// Fails only if the root is missing, not a directory, or unreadable.
    pub fn new(root: &Path, extensions: &[String]) -> Result<Self> {
        if !root.exists() {
            return Err(VidlearnError::Discovery(format!(
                "Input directory not found: {}",
                root.display()
            )));
        }

        if !root.is_dir() {
            return Err(VidlearnError::Discovery(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        std::fs::read_dir(root).map_err(|e| {
            VidlearnError::Discovery(format!("Cannot read {}: {}", root.display(), e))
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
            excluded: Vec::new(),
            pending_dirs: vec![root.to_path_buf()],
            pending_jobs: VecDeque::new(),
        })
    }

    /// Skip the given directories (and everything below them) during the walk.
    ///
    /// Used to keep output trees that live inside the input tree from being
    /// rediscovered. Directories that do not exist yet are ignored.
    pub fn excluding<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.excluded.extend(
            dirs.into_iter()
                .filter_map(|d| d.as_ref().canonicalize().ok()),
        );
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    fn is_excluded(&self, dir: &Path) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        dir.canonicalize()
            .map(|c| self.excluded.iter().any(|ex| *ex == c))
            .unwrap_or(false)
    }

    /// Read one directory, queueing its matching files and its subdirectories.
    fn expand(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                return;
            }
        };

        let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());

        let mut subdirs = Vec::new();
        let mut jobs = Vec::new();
        for entry in entries {
            let path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

            if is_dir {
                if self.is_excluded(&path) {
                    debug!("Skipping output directory {}", path.display());
                } else {
                    subdirs.push(path);
                }
            } else if path.is_file() && self.accepts(&path) {
                if let Some(job) = MediaJob::from_path(&self.root, &path) {
                    jobs.push(job);
                }
            }
        }

        disambiguate_stems(&mut jobs);
        self.pending_jobs.extend(jobs);

        // Reverse so the stack pops subdirectories in name order.
        self.pending_dirs.extend(subdirs.into_iter().rev());
    }
}

impl Iterator for Discovery {
    type Item = MediaJob;

    fn next(&mut self) -> Option<MediaJob> {
        loop {
            if let Some(job) = self.pending_jobs.pop_front() {
                return Some(job);
            }
            let dir = self.pending_dirs.pop()?;
            self.expand(&dir);
        }
    }
}

/// Give sibling jobs that share a stem distinct output names.
fn disambiguate_stems(jobs: &mut [MediaJob]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for job in jobs.iter() {
        *counts.entry(job.base_name().to_lowercase()).or_default() += 1;
    }
    for job in jobs.iter_mut() {
        if counts.get(&job.base_name().to_lowercase()).copied().unwrap_or(0) > 1 {
            debug!("{} shares its name with a sibling", job.display_name());
            job.disambiguate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_missing_root_is_discovery_error() {
        let err = Discovery::new(Path::new("/no/such/input/root"), &exts(&["mp4"]))
            .err()
            .unwrap();
        assert!(matches!(err, VidlearnError::Discovery(_)));
    }

    #[test]
    fn test_file_root_is_discovery_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("video.mp4");
        touch(&file);
        assert!(Discovery::new(&file, &exts(&["mp4"])).is_err());
    }

    #[test]
    fn test_recursive_walk_with_relative_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("top.MP4"));
        touch(&root.join("a/video1.mp4"));
        touch(&root.join("b/clip.mp3"));
        touch(&root.join("b/notes.txt"));
        touch(&root.join("b/deep/er/talk.mkv"));

        let jobs: Vec<MediaJob> = Discovery::new(root, &exts(&["mp4", "mp3"])).unwrap().collect();
        let names: Vec<String> = jobs.iter().map(|j| j.display_name()).collect();

        assert_eq!(names, vec!["top.MP4", "a/video1.mp4", "b/clip.mp3"]);
        assert_eq!(jobs[0].extension, "mp4");
        assert_eq!(jobs[0].relative_subdir, PathBuf::new());
        assert_eq!(jobs[1].relative_subdir, PathBuf::from("a"));
        assert_eq!(jobs[2].base_name(), "clip");
    }

    #[test]
    fn test_excluded_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("talk.mp4"));
        touch(&root.join("Processed/talk.mp3"));

        let jobs: Vec<MediaJob> = Discovery::new(root, &exts(&["mp4", "mp3"]))
            .unwrap()
            .excluding([root.join("Processed"), root.join("does-not-exist")])
            .collect();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].filename, "talk.mp4");
    }

    #[test]
    fn test_shared_stems_get_distinct_output_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a/talk.mp3"));
        touch(&root.join("a/talk.mp4"));
        touch(&root.join("a/other.mp4"));
        touch(&root.join("b/talk.mp4"));

        let jobs: Vec<MediaJob> = Discovery::new(root, &exts(&["mp4", "mp3"])).unwrap().collect();
        let names: Vec<(String, &str)> = jobs
            .iter()
            .map(|j| (j.display_name(), j.output_name()))
            .collect();

        assert_eq!(
            names,
            vec![
                ("a/other.mp4".to_string(), "other"),
                ("a/talk.mp3".to_string(), "talk_mp3"),
                ("a/talk.mp4".to_string(), "talk_mp4"),
                ("b/talk.mp4".to_string(), "talk"),
            ]
        );
    }

    #[test]
    fn test_base_name_strips_only_last_extension() {
        let job = MediaJob::from_path(
            Path::new("/in"),
            Path::new("/in/x/IT_Factor_1.2_Building.mp4"),
        )
        .unwrap();
        assert_eq!(job.base_name(), "IT_Factor_1.2_Building");
        assert_eq!(job.output_name(), "IT_Factor_1.2_Building");
        assert_eq!(job.relative_subdir, PathBuf::from("x"));
    }
}
