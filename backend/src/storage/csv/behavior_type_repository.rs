//! Behavior types are family-wide and stored together in
//! `behavior_types.yaml` at the root of the data directory.

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use super::connection::{read_yaml, write_yaml, CsvConnection};
use crate::domain::models::behavior::BehaviorType;
use crate::storage::traits::BehaviorTypeStorage;

#[derive(Debug, Clone)]
pub struct BehaviorTypeRepository {
    connection: CsvConnection,
}

impl BehaviorTypeRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn file_path(&self) -> PathBuf {
        self.connection.base_directory().join("behavior_types.yaml")
    }

    fn load(&self) -> Result<Vec<BehaviorType>> {
        Ok(read_yaml(&self.file_path())?.unwrap_or_default())
    }

    fn save(&self, behaviors: &[BehaviorType]) -> Result<()> {
        write_yaml(&self.file_path(), &behaviors)
    }
}

impl BehaviorTypeStorage for BehaviorTypeRepository {
    fn store_behavior_type(&self, behavior: &BehaviorType) -> Result<()> {
        let mut behaviors = self.load()?;
        if behaviors.iter().any(|b| b.id == behavior.id) {
            return Err(anyhow!("Behavior type {} already exists", behavior.id));
        }
        behaviors.push(behavior.clone());
        self.save(&behaviors)
    }

    fn get_behavior_type(&self, behavior_type_id: &str) -> Result<Option<BehaviorType>> {
        Ok(self.load()?.into_iter().find(|b| b.id == behavior_type_id))
    }

    fn list_behavior_types(&self) -> Result<Vec<BehaviorType>> {
        let mut behaviors = self.load()?;
        behaviors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(behaviors)
    }

    fn update_behavior_type(&self, behavior: &BehaviorType) -> Result<()> {
        let mut behaviors = self.load()?;
        let existing = behaviors
            .iter_mut()
            .find(|b| b.id == behavior.id)
            .ok_or_else(|| anyhow!("Behavior type {} not found", behavior.id))?;
        *existing = behavior.clone();
        self.save(&behaviors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::{test_behavior, TestEnvironment};

    #[test]
    fn test_behavior_types_round_trip_through_yaml() {
        let env = TestEnvironment::new().unwrap();
        let repo = BehaviorTypeRepository::new(env.connection.clone());
        assert!(repo.list_behavior_types().unwrap().is_empty());

        let mut teeth = test_behavior("Brushed teeth", 1);
        let shouting = test_behavior("Shouting", -2);
        repo.store_behavior_type(&teeth).unwrap();
        repo.store_behavior_type(&shouting).unwrap();

        teeth.points = 2;
        repo.update_behavior_type(&teeth).unwrap();

        let behaviors = repo.list_behavior_types().unwrap();
        assert_eq!(behaviors.len(), 2);
        assert_eq!(behaviors[0].name, "Brushed teeth");
        assert_eq!(behaviors[0].points, 2);
        assert_eq!(repo.get_behavior_type(&shouting.id).unwrap(), Some(shouting));
    }

    #[test]
    fn test_update_missing_behavior_fails() {
        let env = TestEnvironment::new().unwrap();
        let repo = BehaviorTypeRepository::new(env.connection.clone());
        assert!(repo.update_behavior_type(&test_behavior("Nope", 1)).is_err());
    }
}
