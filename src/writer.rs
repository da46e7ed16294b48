//! Batch commit of the rendered file set.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::processor::ProjectFiles;

/// Paths written by a commit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
    pub dry_run: bool,
}

enum Entry<'a> {
    Dir,
    Text(&'a str),
    Binary(&'a [u8]),
}

/// Writes a [`ProjectFiles`] map under an output directory.
pub struct Writer {
    output_root: PathBuf,
    dry_run: bool,
}

impl Writer {
    pub fn new<P: AsRef<Path>>(output_root: P) -> Self {
        Self { output_root: output_root.as_ref().to_path_buf(), dry_run: false }
    }

    /// Lists what would be written without touching the disk.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Creates every directory, then writes text files and binaries in map
    /// order. Parent directories are created on demand.
    ///
    /// # Errors
    /// * `Error::Commit` on the first failure, listing every path that was
    ///   not written
    pub fn commit(&self, project: &ProjectFiles) -> Result<CommitSummary> {
        let entries: Vec<(&str, Entry<'_>)> = project
            .dirs
            .iter()
            .map(|dir| (dir.as_str(), Entry::Dir))
            .chain(project.files.iter().map(|(p, c)| (p.as_str(), Entry::Text(c.as_str()))))
            .chain(project.binaries.iter().map(|(p, b)| (p.as_str(), Entry::Binary(b.as_slice()))))
            .collect();

        let mut summary = CommitSummary { dry_run: self.dry_run, ..Default::default() };

        for (index, (path, entry)) in entries.iter().enumerate() {
            if !self.dry_run {
                if let Err(e) = self.write_entry(path, entry) {
                    return Err(Error::Commit {
                        path: path.to_string(),
                        message: e.to_string(),
                        pending: entries[index..].iter().map(|(p, _)| p.to_string()).collect(),
                    });
                }
            }
            match entry {
                Entry::Dir => summary.dirs.push(path.to_string()),
                _ => summary.files.push(path.to_string()),
            }
        }

        Ok(summary)
    }

    fn write_entry(&self, path: &str, entry: &Entry<'_>) -> std::io::Result<()> {
        let target = self.output_root.join(path);
        match entry {
            Entry::Dir => {
                debug!("Creating directory: {}", target.display());
                fs::create_dir_all(&target)
            }
            Entry::Text(content) => {
                debug!("Writing file: {}", target.display());
                create_parent(&target)?;
                fs::write(&target, content)
            }
            Entry::Binary(bytes) => {
                debug!("Copying file: {}", target.display());
                create_parent(&target)?;
                fs::write(&target, bytes)
            }
        }
    }
}

fn create_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}
