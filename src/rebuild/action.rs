use std::fmt;

/// Work the coordinator schedules in response to mutations.
///
/// Actions are independent: each has its own debounce window and worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RebuildAction {
    /// Derive the page set from the store and sync the registry.
    RecomputePages,
    /// Rewrite the route manifest and notify the bundler.
    RegenerateRoutes,
    /// Tell live clients to refetch page data.
    RefetchQueries,
}

impl RebuildAction {
    pub const ALL: [Self; 3] = [
        Self::RecomputePages,
        Self::RegenerateRoutes,
        Self::RefetchQueries,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::RecomputePages => "pages",
            Self::RegenerateRoutes => "routes",
            Self::RefetchQueries => "fetch",
        }
    }
}

impl fmt::Display for RebuildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
