//! Page mutation classification.
//!
//! Structural changes (anything that alters the route table) regenerate
//! routes; everything else only needs clients to refetch their data.
//! Routes dominate: a change that is both structural and data-only is
//! regenerated.

use super::RebuildAction;
use crate::page::{Page, PageEvent};

/// Decide the rebuild needed when `old` is replaced by `new`.
pub fn classify(old: &Page, new: &Page) -> RebuildAction {
    let path_moved = old.path != new.path && !new.internal.is_dynamic;
    let paginate_toggled = old.query.paginate != new.query.paginate;
    let document_toggled = old.query.document.is_some() != new.query.document.is_some();

    if path_moved || paginate_toggled || document_toggled {
        RebuildAction::RegenerateRoutes
    } else {
        RebuildAction::RefetchQueries
    }
}

/// Creation and removal always change the route table.
pub fn classify_event(event: &PageEvent) -> RebuildAction {
    match event {
        PageEvent::Created(_) | PageEvent::Removed(_) => RebuildAction::RegenerateRoutes,
        PageEvent::Updated { page, old } => classify(old, page),
    }
}
