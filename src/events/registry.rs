// Event registry
//
// Built-ins are registered once at construction, custom events are appended
// as they are authored or replayed from the store. Lookup preserves
// registration order.

use indexmap::IndexMap;

use crate::error::EventError;
use crate::game::Game;

use super::{chain_merge, chain_split, chance_time, slots, star, EventDefinition};

#[derive(Debug, Clone)]
pub struct EventRegistry {
    events: IndexMap<String, EventDefinition>,
}

impl EventRegistry {
    /// Registry holding every built-in event. Fails if any built-in declares a
    /// game it has no strategy for.
    pub fn new() -> Result<Self, EventError> {
        let mut registry = EventRegistry {
            events: IndexMap::new(),
        };
        for definition in [
            chain_merge::definition()?,
            chain_split::definition()?,
            chance_time::definition()?,
            star::definition()?,
            slots::boo_definition()?,
            slots::bank_definition()?,
            slots::item_shop_definition()?,
            slots::gate_definition()?,
        ] {
            registry.events.insert(definition.id.clone(), definition);
        }
        log::debug!("Registered {} built-in events", registry.events.len());
        Ok(registry)
    }

    /// Add or replace a custom event. Built-in ids are reserved.
    pub fn register_custom(&mut self, definition: EventDefinition) -> Result<(), EventError> {
        if let Some(existing) = self.events.get(&definition.id) {
            if !existing.is_custom() {
                return Err(EventError::metadata(format!(
                    "'{}' is the id of a built-in event",
                    definition.id
                )));
            }
        }
        log::info!("Registered custom event '{}'", definition.id);
        self.events.insert(definition.id.clone(), definition);
        Ok(())
    }

    pub fn remove_custom(&mut self, id: &str) -> Option<EventDefinition> {
        match self.events.get(id) {
            Some(def) if def.is_custom() => self.events.shift_remove(id),
            _ => None,
        }
    }

    pub fn get(&self, id: &str) -> Option<&EventDefinition> {
        self.events.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&EventDefinition, EventError> {
        self.get(id)
            .ok_or_else(|| EventError::UnknownEvent(id.to_string()))
    }

    /// Every definition, built-in first.
    pub fn list(&self) -> impl Iterator<Item = &EventDefinition> {
        self.events.values()
    }

    /// Definitions an author may place on a space.
    pub fn authorable(&self) -> impl Iterator<Item = &EventDefinition> {
        self.events.values().filter(|def| !def.fake)
    }

    pub fn custom(&self) -> impl Iterator<Item = &EventDefinition> {
        self.events.values().filter(|def| def.is_custom())
    }

    /// Built-ins that can recognize native code for `game`, in registration
    /// order.
    pub fn recognizers(&self, game: Game) -> Vec<&EventDefinition> {
        self.events
            .values()
            .filter(|def| !def.is_custom() && def.supports(game))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ActivationType;
    use crate::events::{EventBody, EventLanguage, ExecutionType, CHAIN_MERGE, CHANCE_TIME, GATE};
    use test_log::test;

    fn custom(id: &str) -> EventDefinition {
        EventDefinition {
            id: id.to_string(),
            name: id.to_string(),
            language: EventLanguage::Assembly,
            activation: ActivationType::Landing,
            execution: ExecutionType::Direct,
            fake: false,
            supported_games: vec![Game::Mp1Usa],
            parameters: Vec::new(),
            body: EventBody::Custom {
                source: "JR RA\nNOP\n".to_string(),
            },
        }
    }

    #[test]
    fn built_ins_are_registered() {
        let registry = EventRegistry::new().unwrap();
        assert!(registry.get(CHAIN_MERGE).is_some());
        assert!(matches!(registry.require("NOPE"), Err(EventError::UnknownEvent(_))));
        assert_eq!(registry.list().count(), 8);
    }

    #[test]
    fn structural_events_are_not_authorable() {
        let registry = EventRegistry::new().unwrap();
        let ids: Vec<&str> = registry.authorable().map(|d| d.id.as_str()).collect();
        assert!(!ids.contains(&"CHAINMERGE"));
        assert!(!ids.contains(&"CHAINSPLIT"));
        assert!(ids.contains(&CHANCE_TIME));
    }

    #[test]
    fn recognizers_follow_game_support() {
        let registry = EventRegistry::new().unwrap();
        let mp1: Vec<&str> = registry
            .recognizers(Game::Mp1Usa)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert!(mp1.contains(&"STAR"));
        assert!(!mp1.contains(&GATE));
        let mp3 = registry.recognizers(Game::Mp3Usa);
        assert!(mp3.iter().any(|d| d.id == GATE));
    }

    #[test]
    fn custom_events_cannot_shadow_built_ins() {
        let mut registry = EventRegistry::new().unwrap();
        assert!(registry.register_custom(custom(CHANCE_TIME)).is_err());
        registry.register_custom(custom("Coin Rain")).unwrap();
        registry.register_custom(custom("Coin Rain")).unwrap();
        assert_eq!(registry.custom().count(), 1);
        assert!(registry.remove_custom(CHANCE_TIME).is_none());
        assert!(registry.remove_custom("Coin Rain").is_some());
    }
}
