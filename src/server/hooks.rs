//! Server lifecycle hooks.
//!
//! Two stages fire once each when the server starts listening: `setup`,
//! then `after_setup`. Handlers receive a [`ServerSetup`] and install
//! middleware through it, so everything tapped into `setup` runs before
//! anything tapped into `after_setup`.

use std::fmt;

use super::endpoints::ServerEndpoints;
use super::middleware::{Middleware, MiddlewareChain};
use crate::hooks::{HookError, Taps};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Setup,
    AfterSetup,
}

impl HookStage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::AfterSetup => "after_setup",
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type SetupHook = Box<dyn FnOnce(&mut ServerSetup) + Send>;

/// What hook handlers may touch while the server starts.
pub struct ServerSetup {
    endpoints: ServerEndpoints,
    chain: MiddlewareChain,
}

impl ServerSetup {
    pub(super) fn new(endpoints: ServerEndpoints) -> Self {
        Self {
            endpoints,
            chain: MiddlewareChain::default(),
        }
    }

    pub fn endpoints(&self) -> &ServerEndpoints {
        &self.endpoints
    }

    /// Append to the request chain.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) {
        self.chain.push(middleware);
    }

    pub(super) fn into_chain(self) -> MiddlewareChain {
        self.chain
    }
}

pub struct HookPipeline {
    setup: Taps<SetupHook>,
    after_setup: Taps<SetupHook>,
}

impl Default for HookPipeline {
    fn default() -> Self {
        Self {
            setup: Taps::new(HookStage::Setup.name()),
            after_setup: Taps::new(HookStage::AfterSetup.name()),
        }
    }
}

impl HookPipeline {
    pub fn tap(
        &mut self,
        stage: HookStage,
        name: impl Into<String>,
        hook: impl FnOnce(&mut ServerSetup) + Send + 'static,
    ) -> Result<(), HookError> {
        let taps = match stage {
            HookStage::Setup => &mut self.setup,
            HookStage::AfterSetup => &mut self.after_setup,
        };
        taps.tap(name, Box::new(hook))
    }

    #[cfg(test)]
    pub fn tapped(&self, stage: HookStage) -> Vec<&str> {
        match stage {
            HookStage::Setup => self.setup.names().collect(),
            HookStage::AfterSetup => self.after_setup.names().collect(),
        }
    }

    /// Fire every stage in order, consuming the handlers.
    pub(super) fn fire(&mut self, setup: &mut ServerSetup) {
        for taps in [&mut self.setup, &mut self.after_setup] {
            for (name, hook) in taps.take() {
                crate::debug!("serve"; "{} <- {}", taps.stage(), name);
                hook(setup);
            }
        }
    }
}

impl fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookPipeline")
            .field("setup", &self.setup)
            .field("after_setup", &self.after_setup)
            .finish()
    }
}
