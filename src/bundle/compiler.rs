//! Compile notifications.
//!
//! Every route regeneration ends with a `done` notification carrying its
//! [`CompileStats`]. The develop host taps it to print the site banner.

use std::time::Duration;

use crate::hooks::{HookError, Taps};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub errors: Vec<String>,
    pub routes: usize,
    pub duration: Duration,
}

impl CompileStats {
    pub fn success(routes: usize, duration: Duration) -> Self {
        Self {
            errors: Vec::new(),
            routes,
            duration,
        }
    }

    pub fn failure(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            errors: vec![error.into()],
            routes: 0,
            duration,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub type DoneHook = Box<dyn Fn(&CompileStats) + Send + Sync>;

#[derive(Debug)]
pub struct CompilerHooks {
    done: Taps<DoneHook>,
}

impl Default for CompilerHooks {
    fn default() -> Self {
        Self {
            done: Taps::new("done"),
        }
    }
}

impl CompilerHooks {
    pub fn tap_done(
        &mut self,
        name: impl Into<String>,
        hook: impl Fn(&CompileStats) + Send + Sync + 'static,
    ) -> Result<(), HookError> {
        self.done.tap(name, Box::new(hook))
    }

    pub fn emit_done(&self, stats: &CompileStats) {
        for (name, hook) in self.done.iter() {
            crate::debug!("compile"; "done -> {}", name);
            hook(stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[test]
    fn test_done_hooks_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = CompilerHooks::default();
        for name in ["banner", "log"] {
            let seen = Arc::clone(&seen);
            hooks
                .tap_done(name, move |stats| seen.lock().push((name, stats.has_errors())))
                .unwrap();
        }

        hooks.emit_done(&CompileStats::success(3, Duration::ZERO));
        hooks.emit_done(&CompileStats::failure("boom", Duration::ZERO));

        assert_eq!(
            *seen.lock(),
            vec![("banner", false), ("log", false), ("banner", true), ("log", true)]
        );
    }

    #[test]
    fn test_duplicate_done_tap() {
        let mut hooks = CompilerHooks::default();
        hooks.tap_done("develop", |_| {}).unwrap();
        assert!(hooks.tap_done("develop", |_| {}).is_err());
    }
}
