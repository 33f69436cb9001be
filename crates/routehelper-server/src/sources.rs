//! Raw navigation data files under the data directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use routehelper_core::cycle::CycleFile;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

const CYCLE_FILE: &str = "cycle.json";
const AIRPORT_FILES: [&str; 2] = ["earth_aptmeta.dat", "earth_metadata.dat"];
const FIX_FILE: &str = "earth_fix.dat";
const AIRWAY_FILE: &str = "earth_awy.dat";
const PROCEDURE_DIR: &str = "CIFP";
const PROCEDURE_EXTENSION: &str = "dat";

/// Locations of the source files inside one data directory.
#[derive(Debug, Clone)]
pub struct NavDataSources {
    root: PathBuf,
}

impl NavDataSources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parsed `cycle.json`, or `None` when it is missing or unreadable.
    pub async fn read_cycle(&self) -> Option<CycleFile> {
        let path = self.root.join(CYCLE_FILE);
        let text = tokio::fs::read_to_string(&path).await.ok()?;
        match CycleFile::from_json(&text) {
            Ok(file) => Some(file),
            Err(err) => {
                warn!("Ignoring {}: {}", path.display(), err);
                None
            }
        }
    }

    /// First airport metadata file that exists.
    pub async fn airport_file(&self) -> Option<PathBuf> {
        for name in AIRPORT_FILES {
            let path = self.root.join(name);
            if is_file(&path).await {
                return Some(path);
            }
        }
        None
    }

    pub async fn fix_file(&self) -> Option<PathBuf> {
        let path = self.root.join(FIX_FILE);
        is_file(&path).await.then_some(path)
    }

    pub async fn airway_file(&self) -> Option<PathBuf> {
        let path = self.root.join(AIRWAY_FILE);
        is_file(&path).await.then_some(path)
    }

    /// `CIFP/` when present, else the data directory itself.
    pub async fn procedure_dir(&self) -> PathBuf {
        let dir = self.root.join(PROCEDURE_DIR);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => dir,
            _ => self.root.clone(),
        }
    }

    /// Procedure files (`*.dat`, any case) sorted by file name, paired with
    /// the upper-cased airport code taken from the file stem.
    pub async fn procedure_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let dir = self.procedure_dir().await;
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("listing {}", dir.display()))?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_dat = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(PROCEDURE_EXTENSION));
            if !is_dat || !is_file(&path).await {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            files.push((stem.to_ascii_uppercase(), path));
        }
        files.sort_by(|a, b| a.1.file_name().cmp(&b.1.file_name()));
        Ok(files)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Line reader that replaces invalid UTF-8 instead of failing.
pub struct SourceLines {
    reader: BufReader<File>,
    buf: Vec<u8>,
}

impl SourceLines {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        Ok(Self {
            reader: BufReader::new(file),
            buf: Vec::with_capacity(256),
        })
    }

    /// Next line without its terminator, or `None` at end of file.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&self.buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lossy_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.dat");
        tokio::fs::write(&path, b"first\r\nsec\xffond\nlast").await.unwrap();

        let mut lines = SourceLines::open(&path).await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("sec\u{fffd}ond"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let sources = NavDataSources::new(dir.path());
        assert!(sources.airport_file().await.is_none());
        assert!(sources.read_cycle().await.is_none());
        assert_eq!(sources.procedure_dir().await, dir.path());

        tokio::fs::write(dir.path().join("earth_metadata.dat"), "").await.unwrap();
        assert!(sources.airport_file().await.unwrap().ends_with("earth_metadata.dat"));
        tokio::fs::write(dir.path().join("earth_aptmeta.dat"), "").await.unwrap();
        assert!(sources.airport_file().await.unwrap().ends_with("earth_aptmeta.dat"));

        tokio::fs::write(dir.path().join("cycle.json"), r#"{"cycle": "2510"}"#).await.unwrap();
        assert_eq!(sources.read_cycle().await.unwrap().cycle, "2510");

        let cifp = dir.path().join("CIFP");
        tokio::fs::create_dir(&cifp).await.unwrap();
        tokio::fs::write(cifp.join("lfpg.dat"), "").await.unwrap();
        tokio::fs::write(cifp.join("EDDF.DAT"), "").await.unwrap();
        tokio::fs::write(cifp.join("notes.txt"), "").await.unwrap();

        let files = sources.procedure_files().await.unwrap();
        let codes: Vec<&str> = files.iter().map(|(code, _)| code.as_str()).collect();
        assert_eq!(codes, vec!["EDDF", "LFPG"]);
    }
}
