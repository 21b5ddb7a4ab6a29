//! Offscreen document that export scaffolds are attached to.
//!
//! The document is shared between exports and any host that inspects it.
//! A scaffold is only reachable through an [`AttachedScaffold`] guard, and
//! dropping the guard detaches it, so every exit path of an export
//! (success, error, early return, cancellation of the future) releases it.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::compositor::StripScaffold;

#[derive(Debug, Default)]
struct DocumentState {
    next_id: u64,
    /// Attached scaffold ids and their pixel size.
    attached: BTreeMap<u64, (u32, u32)>,
}

/// Shared offscreen surface.
#[derive(Debug, Clone, Default)]
pub struct OffscreenDocument {
    state: Arc<Mutex<DocumentState>>,
}

impl OffscreenDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Attach a scaffold; it stays attached until the guard is dropped.
    pub fn attach(&self, scaffold: StripScaffold) -> AttachedScaffold {
        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state
                .attached
                .insert(id, (scaffold.width, scaffold.height));
            id
        };
        tracing::debug!(id, "Scaffold attached");
        AttachedScaffold {
            id,
            document: self.clone(),
            scaffold,
        }
    }

    /// Number of scaffolds currently attached.
    pub fn attached_count(&self) -> usize {
        self.lock().attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached_count() == 0
    }

    fn detach(&self, id: u64) {
        let removed = self.lock().attached.remove(&id).is_some();
        if removed {
            tracing::debug!(id, "Scaffold detached");
        }
    }
}

/// A scaffold attached to an [`OffscreenDocument`].
#[derive(Debug)]
pub struct AttachedScaffold {
    id: u64,
    document: OffscreenDocument,
    scaffold: StripScaffold,
}

impl AttachedScaffold {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Deref for AttachedScaffold {
    type Target = StripScaffold;

    fn deref(&self) -> &StripScaffold {
        &self.scaffold
    }
}

impl Drop for AttachedScaffold {
    fn drop(&mut self) {
        self.document.detach(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{build_scaffold, StripLayout};
    use photostrip_model::ExportBackground;

    fn scaffold() -> StripScaffold {
        build_scaffold(&[], &ExportBackground::NEUTRAL, &StripLayout::default())
    }

    #[test]
    fn test_guard_detaches_on_drop() {
        let document = OffscreenDocument::new();
        {
            let attached = document.attach(scaffold());
            assert_eq!(document.attached_count(), 1);
            assert_eq!(attached.width, 400);
        }
        assert!(document.is_empty());
    }

    #[test]
    fn test_guard_detaches_on_early_return() {
        fn fails(document: &OffscreenDocument) -> Result<(), &'static str> {
            let _attached = document.attach(scaffold());
            Err("rasterizer exploded")
        }

        let document = OffscreenDocument::new();
        assert!(fails(&document).is_err());
        assert!(document.is_empty());
    }

    #[test]
    fn test_ids_are_unique_across_clones() {
        let document = OffscreenDocument::new();
        let handle = document.clone();
        let a = document.attach(scaffold());
        let b = handle.attach(scaffold());
        assert_ne!(a.id(), b.id());
        assert_eq!(document.attached_count(), 2);
        drop(a);
        assert_eq!(handle.attached_count(), 1);
    }
}
