// Build context
//
// Threaded through every parse and write call. Templates captured while
// parsing are kept for the whole session; the scratch area (slot counters and
// assigned spaces) belongs to a single build and is cleared by `begin_build`.
// Independent builds each get their own context.

use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

use crate::error::EventError;
use crate::game::Game;
use crate::signature::{Capture, Signature};

/// A routine captured from the image with its operand fields zeroed.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTemplate {
    pub signature: &'static Signature,
    pub bytes: Vec<u8>,
    /// Operand values seen when the template was first captured
    pub captured: IndexMap<&'static str, u32>,
}

#[derive(Debug, Clone, Default)]
struct Scratch {
    counters: HashMap<String, usize>,
    assigned: HashMap<String, BTreeSet<usize>>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    templates: HashMap<(String, Game), CachedTemplate>,
    scratch: Scratch,
}

impl BuildContext {
    pub fn new() -> Self {
        BuildContext::default()
    }

    /// Clear per-build scratch state. Cached templates survive.
    pub fn begin_build(&mut self) {
        log::debug!(
            "Starting build with {} cached templates",
            self.templates.len()
        );
        self.scratch = Scratch::default();
    }

    /// Record a captured template. The first capture for a key wins; later
    /// matches of the same routine carry the same masked bytes.
    pub fn cache_template(
        &mut self,
        event_id: &str,
        game: Game,
        signature: &'static Signature,
        capture: Capture,
    ) {
        self.templates
            .entry((event_id.to_string(), game))
            .or_insert_with(|| {
                log::debug!("Cached {} template for {} ({})", event_id, game, signature.name);
                CachedTemplate {
                    signature,
                    bytes: capture.template,
                    captured: capture.values,
                }
            });
    }

    pub fn template(&self, event_id: &str, game: Game) -> Option<&CachedTemplate> {
        self.templates.get(&(event_id.to_string(), game))
    }

    /// The cached template, or a write fault naming what is missing.
    pub fn require_template(&self, event_id: &str, game: Game) -> Result<&CachedTemplate, EventError> {
        self.template(event_id, game).ok_or_else(|| {
            EventError::write_fault(format!(
                "no captured {} template for {}; the board must be parsed before it is written",
                event_id, game
            ))
        })
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Claim the next value of the per-event counter.
    pub fn next_counter(&mut self, event_id: &str) -> usize {
        let counter = self.scratch.counters.entry(event_id.to_string()).or_insert(0);
        let value = *counter;
        *counter += 1;
        value
    }

    pub fn counter(&self, event_id: &str) -> usize {
        self.scratch.counters.get(event_id).copied().unwrap_or(0)
    }

    /// Mark `space` as assigned for `event_id`. Returns false if it already was.
    pub fn mark_assigned(&mut self, event_id: &str, space: usize) -> bool {
        self.scratch
            .assigned
            .entry(event_id.to_string())
            .or_default()
            .insert(space)
    }

    pub fn is_assigned(&self, event_id: &str, space: usize) -> bool {
        self.scratch
            .assigned
            .get(event_id)
            .map_or(false, |set| set.contains(&space))
    }

    pub fn assigned(&self, event_id: &str) -> Vec<usize> {
        self.scratch
            .assigned
            .get(event_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::signatures::CHANCE_TIME_MP1;
    use test_log::test;

    fn capture() -> Capture {
        CHANCE_TIME_MP1
            .match_bytes(&CHANCE_TIME_MP1.canonical_template())
            .unwrap()
    }

    #[test]
    fn templates_are_keyed_by_event_and_game() {
        let mut ctx = BuildContext::new();
        ctx.cache_template("CHANCETIME", Game::Mp1Usa, &CHANCE_TIME_MP1, capture());
        assert!(ctx.template("CHANCETIME", Game::Mp1Usa).is_some());
        assert!(ctx.template("CHANCETIME", Game::Mp2Usa).is_none());
        assert!(matches!(
            ctx.require_template("CHAINMERGE", Game::Mp1Usa),
            Err(EventError::WriteFault(_))
        ));
    }

    #[test]
    fn begin_build_resets_scratch_only() {
        let mut ctx = BuildContext::new();
        ctx.cache_template("CHANCETIME", Game::Mp1Usa, &CHANCE_TIME_MP1, capture());
        assert_eq!(ctx.next_counter("BANK"), 0);
        assert_eq!(ctx.next_counter("BANK"), 1);
        assert!(ctx.mark_assigned("BANK", 4));
        assert!(!ctx.mark_assigned("BANK", 4));

        ctx.begin_build();
        assert_eq!(ctx.counter("BANK"), 0);
        assert!(!ctx.is_assigned("BANK", 4));
        assert_eq!(ctx.template_count(), 1);
    }

    #[test]
    fn cloned_contexts_do_not_share_scratch() {
        let mut a = BuildContext::new();
        let mut b = a.clone();
        a.next_counter("BOO");
        assert_eq!(b.next_counter("BOO"), 0);
        assert_eq!(a.counter("BOO"), 1);
    }
}
