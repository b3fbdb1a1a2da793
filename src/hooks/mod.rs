//! Named extension points.
//!
//! A [`Taps`] list belongs to one stage of a lifecycle (server `setup`,
//! compiler `done`, ...). Handlers are registered under a tapper name that
//! must be unique within the stage and run in registration order.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("`{name}` is already tapped into `{stage}`")]
    DuplicateTap { stage: &'static str, name: String },
}

pub struct Taps<H> {
    stage: &'static str,
    taps: Vec<(String, H)>,
}

impl<H> Taps<H> {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            taps: Vec::new(),
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Register `handler` under `name`. Rejects a name already tapped.
    pub fn tap(&mut self, name: impl Into<String>, handler: H) -> Result<(), HookError> {
        let name = name.into();
        if self.taps.iter().any(|(existing, _)| *existing == name) {
            return Err(HookError::DuplicateTap {
                stage: self.stage,
                name,
            });
        }
        self.taps.push((name, handler));
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.taps.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &H)> {
        self.taps.iter().map(|(name, h)| (name.as_str(), h))
    }

    /// Remove all handlers, in registration order.
    pub fn take(&mut self) -> Vec<(String, H)> {
        std::mem::take(&mut self.taps)
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

impl<H> std::fmt::Debug for Taps<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Taps")
            .field("stage", &self.stage)
            .field("taps", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
