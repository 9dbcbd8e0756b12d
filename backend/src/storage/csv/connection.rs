use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use super::{
    BehaviorTypeRepository, ChildRepository, EventRepository, RewardHistoryRepository,
    RewardRepository,
};
use crate::storage::traits::Connection;

const DEFAULT_DIRECTORY_NAME: &str = "Tiny Wins";

/// CsvConnection manages the data directory and the per-child directories in it
#[derive(Debug, Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("Failed to create data directory {:?}", base_path))?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a new CSV connection in the platform data directory
    pub fn new_default() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine a data directory"))?;
        let path = data_dir.join(DEFAULT_DIRECTORY_NAME);
        info!("Using default data directory: {}", path.display());
        Self::new(path)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Generate a filesystem-safe directory name from a child id
    /// Converts "child::1b4e28ba-2fa1" -> "child_1b4e28ba-2fa1"
    pub fn safe_directory_name(child_id: &str) -> String {
        let mut name = String::with_capacity(child_id.len());
        for c in child_id.chars() {
            let mapped = if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            };
            // Collapse runs of separators
            if mapped == '_' && name.ends_with('_') {
                continue;
            }
            name.push(mapped);
        }
        name.trim_matches('_').to_string()
    }

    /// Get the directory path for a child's data
    pub fn get_child_directory(&self, child_id: &str) -> PathBuf {
        self.base_directory.join(Self::safe_directory_name(child_id))
    }

    /// Ensure the child's directory exists, returning its path
    pub fn ensure_child_directory(&self, child_id: &str) -> Result<PathBuf> {
        let dir = self.get_child_directory(child_id);
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create child directory {:?}", dir))?;
            debug!("Created child directory: {}", dir.display());
        }
        Ok(dir)
    }

    /// Every child directory currently in the data directory
    pub fn child_directories(&self) -> Result<Vec<PathBuf>> {
        let mut directories = Vec::new();
        for entry in fs::read_dir(&self.base_directory)? {
            let path = entry?.path();
            if path.is_dir() {
                directories.push(path);
            }
        }
        directories.sort();
        Ok(directories)
    }
}

impl Connection for CsvConnection {
    type ChildRepository = ChildRepository;
    type BehaviorTypeRepository = BehaviorTypeRepository;
    type EventRepository = EventRepository;
    type RewardRepository = RewardRepository;
    type RewardHistoryRepository = RewardHistoryRepository;

    fn create_child_repository(&self) -> Self::ChildRepository {
        ChildRepository::new(self.clone())
    }

    fn create_behavior_type_repository(&self) -> Self::BehaviorTypeRepository {
        BehaviorTypeRepository::new(self.clone())
    }

    fn create_event_repository(&self) -> Self::EventRepository {
        EventRepository::new(self.clone())
    }

    fn create_reward_repository(&self) -> Self::RewardRepository {
        RewardRepository::new(self.clone())
    }

    fn create_reward_history_repository(&self) -> Self::RewardHistoryRepository {
        RewardHistoryRepository::new(self.clone())
    }
}

/// Read every well-formed record from a CSV file. Missing files read as empty;
/// malformed rows are skipped with a warning.
pub(crate) fn read_csv_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Skipping malformed row {} in {:?}: {}", line + 2, path, e);
            }
        }
    }
    Ok(records)
}

/// Append one record, writing the header first if the file is new or empty
pub(crate) fn append_csv_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {:?} for append", path))?;

    let mut writer = WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(record)?;
    writer.flush()?;
    Ok(())
}

/// Rewrite a whole CSV file through a temp file and rename
pub(crate) fn write_csv_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let temp_path = path.with_extension("csv.tmp");
    {
        let mut writer = WriterBuilder::new()
            .has_headers(true)
            .from_path(&temp_path)
            .with_context(|| format!("Failed to create {:?}", temp_path))?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    fs::rename(&temp_path, path)?;
    debug!("Wrote {} records to {:?}", records.len(), path);
    Ok(())
}

pub(crate) fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML in {:?}", path))?;
    Ok(Some(value))
}

/// Write YAML atomically: temp file, then rename
pub(crate) fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let yaml_content = serde_yaml::to_string(value)?;
    let temp_path = path.with_extension("yaml.tmp");
    fs::write(&temp_path, yaml_content)?;
    fs::rename(&temp_path, path)?;
    debug!("Saved {:?}", path);
    Ok(())
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp '{}'", value))?
        .with_timezone(&Utc))
}

pub(crate) fn parse_optional_timestamp(value: &Option<String>) -> Result<Option<DateTime<Utc>>> {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(Some(parse_timestamp(s)?)),
        _ => Ok(None),
    }
}
