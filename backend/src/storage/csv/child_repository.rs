//! # CSV Child Repository
//!
//! Each child lives in its own directory with a `child.yaml` record:
//!
//! ```yaml
//! id: child::1b4e28ba-2fa1-11d2-883f-0016d3cca427
//! name: Emma
//! color_tag: "#FFB347"
//! total_points: 42
//! is_archived: false
//! created_at: 2025-01-20T10:00:00Z
//! updated_at: 2025-01-21T19:35:00Z
//! ```

use anyhow::{anyhow, Result};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

use super::connection::{read_yaml, write_yaml, CsvConnection};
use crate::domain::models::child::Child;
use crate::storage::traits::ChildStorage;

const CHILD_FILE: &str = "child.yaml";

/// CSV-backed child repository using filesystem discovery
#[derive(Debug, Clone)]
pub struct ChildRepository {
    connection: CsvConnection,
}

impl ChildRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn get_child_yaml_path(&self, child_id: &str) -> PathBuf {
        self.connection.get_child_directory(child_id).join(CHILD_FILE)
    }
}

impl ChildStorage for ChildRepository {
    fn store_child(&self, child: &Child) -> Result<()> {
        let path = self.get_child_yaml_path(&child.id);
        if path.exists() {
            return Err(anyhow!("Child {} already exists", child.id));
        }
        self.connection.ensure_child_directory(&child.id)?;
        write_yaml(&path, child)?;
        info!("Stored child {} in {:?}", child.id, path);
        Ok(())
    }

    fn get_child(&self, child_id: &str) -> Result<Option<Child>> {
        read_yaml(&self.get_child_yaml_path(child_id))
    }

    fn list_children(&self) -> Result<Vec<Child>> {
        let mut children = Vec::new();
        for dir in self.connection.child_directories()? {
            let path = dir.join(CHILD_FILE);
            match read_yaml::<Child>(&path) {
                Ok(Some(child)) => children.push(child),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable child record {:?}: {}", path, e),
            }
        }
        children.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(children)
    }

    fn update_child(&self, child: &Child) -> Result<()> {
        let path = self.get_child_yaml_path(&child.id);
        if !path.exists() {
            return Err(anyhow!("Child {} not found", child.id));
        }
        write_yaml(&path, child)
    }

    fn delete_child(&self, child_id: &str) -> Result<bool> {
        let dir = self.connection.get_child_directory(child_id);
        if !dir.join(CHILD_FILE).exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        info!("Deleted child directory {:?}", dir);
        Ok(true)
    }
}
