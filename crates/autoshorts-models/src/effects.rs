//! Effect selection with toggle semantics.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Effect;

/// Set of effects applied to a job.
///
/// Keeps the order in which effects were first enabled and never holds
/// duplicates. Serializes as a plain array of effect ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EffectSet(Vec<Effect>);

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the effect if it is off, disable it if it is on.
    ///
    /// Returns whether the effect is enabled afterwards.
    pub fn toggle(&mut self, effect: Effect) -> bool {
        if let Some(pos) = self.0.iter().position(|e| *e == effect) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(effect);
            true
        }
    }

    /// Enable the effect; no-op if already enabled.
    pub fn insert(&mut self, effect: Effect) {
        if !self.contains(effect) {
            self.0.push(effect);
        }
    }

    pub fn contains(&self, effect: Effect) -> bool {
        self.0.contains(&effect)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Effect> for EffectSet {
    fn from_iter<I: IntoIterator<Item = Effect>>(iter: I) -> Self {
        let mut set = EffectSet::new();
        for effect in iter {
            set.insert(effect);
        }
        set
    }
}
