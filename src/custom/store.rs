// Custom event persistence
//
// Authored events are kept in a TOML file as `[[event]]` tables. The source
// text is authoritative: loading replays every record through
// `create_custom_event`, so a record whose pragmas no longer parse is
// reported instead of silently registered.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::board::ActivationType;
use crate::error::EventError;
use crate::events::{EventDefinition, EventLanguage, EventRegistry, ExecutionType};
use crate::game::Game;

/// One stored event. Everything except `id`, `language`, `activation` and
/// `source` is a readable summary rebuilt from the source on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEventRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub language: EventLanguage,
    /// Activation chosen by the author, which may differ from the default
    pub activation: ActivationType,
    #[serde(default = "default_execution")]
    pub execution: ExecutionType,
    #[serde(default)]
    pub games: Vec<Game>,
    /// `Type|name` pairs
    #[serde(default)]
    pub parameters: Vec<String>,
    pub source: String,
}

fn default_execution() -> ExecutionType {
    ExecutionType::Direct
}

impl CustomEventRecord {
    pub fn from_definition(def: &EventDefinition) -> Result<Self, EventError> {
        let source = def.source().ok_or_else(|| {
            EventError::metadata(format!("{} is a built-in event and cannot be stored", def.id))
        })?;
        Ok(CustomEventRecord {
            id: def.id.clone(),
            name: def.name.clone(),
            language: def.language,
            activation: def.activation,
            execution: def.execution,
            games: def.supported_games.clone(),
            parameters: def
                .parameters
                .iter()
                .map(|p| format!("{}|{}", p.param_type, p.name))
                .collect(),
            source: source.to_string(),
        })
    }

    pub fn definition(&self) -> Result<EventDefinition, EventError> {
        let mut def = super::create_custom_event(self.language, &self.source)?;
        if def.id != self.id {
            log::warn!("Stored event '{}' now names itself '{}'", self.id, def.id);
        }
        def.activation = self.activation;
        Ok(def)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default, rename = "event")]
    events: Vec<CustomEventRecord>,
}

#[derive(Debug, Clone)]
pub struct CustomEventStore {
    path: PathBuf,
    records: IndexMap<String, CustomEventRecord>,
}

impl CustomEventStore {
    /// Read the store at `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, EventError> {
        let mut store = CustomEventStore {
            path: path.to_path_buf(),
            records: IndexMap::new(),
        };
        if !path.exists() {
            log::debug!("No custom events at {}", path.display());
            return Ok(store);
        }
        let text = fs::read_to_string(path)?;
        let file: StoreFile = toml::from_str(&text)
            .map_err(|e| EventError::Config(format!("{}: {}", path.display(), e)))?;
        for record in file.events {
            store.records.insert(record.id.clone(), record);
        }
        log::info!(
            "Loaded {} custom event(s) from {}",
            store.records.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn save(&self) -> Result<(), EventError> {
        let file = StoreFile {
            events: self.records.values().cloned().collect(),
        };
        let text = toml::to_string_pretty(&file).map_err(|e| EventError::Config(e.to_string()))?;
        fs::write(&self.path, text)?;
        log::debug!(
            "Saved {} custom event(s) to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CustomEventRecord> {
        self.records.get(id)
    }

    /// Add or replace the record for `def`.
    pub fn insert(&mut self, def: &EventDefinition) -> Result<(), EventError> {
        let record = CustomEventRecord::from_definition(def)?;
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<CustomEventRecord> {
        self.records.shift_remove(id)
    }

    /// Every stored event as a definition, in insertion order.
    pub fn definitions(&self) -> Result<Vec<EventDefinition>, EventError> {
        self.records.values().map(CustomEventRecord::definition).collect()
    }

    /// Register every stored event. Returns how many were added.
    pub fn register_all(&self, registry: &mut EventRegistry) -> Result<usize, EventError> {
        let definitions = self.definitions()?;
        let count = definitions.len();
        for def in definitions {
            registry.register_custom(def)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::create_custom_event;
    use tempfile::TempDir;
    use test_log::test;

    const WARP: &str = "; NAME: Warp\n; GAMES: MP2_USA\n; PARAM: Space|dest\n  li a0, dest\n";
    const TUNE: &str = "// NAME: Tune\n// GAMES: MP1_USA\nvoid main() { PlayMusic(3); }\n";

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CustomEventStore::load(&dir.path().join("none.toml")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn save_and_reload_keeps_order_and_activation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom_events.toml");
        let mut store = CustomEventStore::load(&path).unwrap();

        let mut warp = create_custom_event(EventLanguage::Assembly, WARP).unwrap();
        warp.activation = ActivationType::Walkover;
        store.insert(&warp).unwrap();
        store.insert(&create_custom_event(EventLanguage::C, TUNE).unwrap()).unwrap();
        store.save().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[[event]]"));
        assert!(text.contains("Space|dest"));
        assert!(text.contains("MP2_USA"));

        let reloaded = CustomEventStore::load(&path).unwrap();
        let defs = reloaded.definitions().unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].id, "Warp");
        assert_eq!(defs[0].activation, ActivationType::Walkover);
        assert_eq!(defs[0].parameters.len(), 1);
        assert_eq!(defs[1].id, "Tune");
        assert_eq!(defs[1].language, EventLanguage::C);
        assert_eq!(defs[1].activation, ActivationType::Landing);
    }

    #[test]
    fn insert_replaces_and_remove_forgets() {
        let dir = TempDir::new().unwrap();
        let mut store = CustomEventStore::load(&dir.path().join("events.toml")).unwrap();
        let warp = create_custom_event(EventLanguage::Assembly, WARP).unwrap();
        store.insert(&warp).unwrap();
        store.insert(&warp).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.remove("Warp").is_some());
        assert!(store.get("Warp").is_none());
    }

    #[test]
    fn built_in_events_cannot_be_stored() {
        let registry = EventRegistry::new().unwrap();
        let dir = TempDir::new().unwrap();
        let mut store = CustomEventStore::load(&dir.path().join("events.toml")).unwrap();
        let star = registry.get(crate::events::STAR).unwrap();
        assert!(store.insert(star).is_err());
    }

    #[test]
    fn register_all_adds_to_registry() {
        let dir = TempDir::new().unwrap();
        let mut store = CustomEventStore::load(&dir.path().join("events.toml")).unwrap();
        store.insert(&create_custom_event(EventLanguage::Assembly, WARP).unwrap()).unwrap();
        let mut registry = EventRegistry::new().unwrap();
        let before = registry.len();
        assert_eq!(store.register_all(&mut registry).unwrap(), 1);
        assert_eq!(registry.len(), before + 1);
        assert!(registry.get("Warp").unwrap().is_custom());
    }

    #[test]
    fn unparsable_store_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.toml");
        fs::write(&path, "[[event]]\nid = 3\n").unwrap();
        assert!(matches!(
            CustomEventStore::load(&path),
            Err(EventError::Config(_))
        ));
    }
}
