//! Primary result plus best-effort side effects
//!
//! Operations such as bill creation or visit recording have secondary
//! bookkeeping (visit append, notification fan-out) that must never fail the
//! primary write. [`Outcome`] carries the primary value together with a
//! record of what happened to each side effect, so callers can inspect
//! failures without them being surfaced as errors.

use serde::{Deserialize, Serialize};

/// What happened to one side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectStatus {
    Applied,
    Skipped,
    Failed,
}

/// A named side effect, its status and, unless applied, the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffect {
    pub name: String,
    pub status: EffectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SideEffect {
    pub fn applied(name: impl Into<String>) -> Self {
        Self { name: name.into(), status: EffectStatus::Applied, reason: None }
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { name: name.into(), status: EffectStatus::Skipped, reason: Some(reason.into()) }
    }

    pub fn failed(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self { name: name.into(), status: EffectStatus::Failed, reason: Some(reason.to_string()) }
    }

    pub fn is_failed(&self) -> bool {
        self.status == EffectStatus::Failed
    }
}

/// The value of a successful primary operation and its side effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome<T> {
    pub primary: T,
    pub side_effects: Vec<SideEffect>,
}

impl<T> Outcome<T> {
    pub fn new(primary: T) -> Self {
        Self { primary, side_effects: Vec::new() }
    }

    pub fn with_effect(mut self, effect: SideEffect) -> Self {
        self.side_effects.push(effect);
        self
    }

    pub fn push(&mut self, effect: SideEffect) {
        self.side_effects.push(effect);
    }

    /// Appends the side effects of a nested outcome, returning its primary
    pub fn absorb<U>(&mut self, nested: Outcome<U>) -> U {
        self.side_effects.extend(nested.side_effects);
        nested.primary
    }

    pub fn has_failures(&self) -> bool {
        self.side_effects.iter().any(SideEffect::is_failed)
    }

    pub fn effect(&self, name: &str) -> Option<&SideEffect> {
        self.side_effects.iter().find(|e| e.name == name)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            primary: f(self.primary),
            side_effects: self.side_effects,
        }
    }

    pub fn into_primary(self) -> T {
        self.primary
    }
}
