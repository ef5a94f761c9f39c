//! Reference reconciliation: turning a mixed list of `{id}` / `{name}`
//! descriptors into a validated list of entity ids.
//!
//! One reconciler serves both entity kinds; the kind is a strategy
//! parameter (store handle + label), never a copy-pasted code path.
//!
//! ## Algorithm
//!
//! 1. Partition descriptors into `with_id` and `with_name`, preserving
//!    relative order within each partition. Malformed ids and empty
//!    descriptors fail here, before any store call.
//! 2. Validate ownership of the `with_id` subset (one counted query).
//! 3. Resolve the `with_name` subset through a single batched
//!    find-or-create, scoped to the owner.
//! 4. Recombine: validated ids, then resolved ids, deduplicated.
//!
//! Order relaxation: the output keeps each partition's relative order but
//! does not reproduce the literal interleaving of the request. Every
//! requested entity is present exactly once.
//!
//! Failure is atomic per call: a duplicate name inside the batch, an
//! unowned id, or a store error fails the whole reconciliation and no note
//! update is applied afterwards.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ident;
use crate::models::{EntityKind, RefInput};
use crate::traits::ReferenceStore;

/// Confirm every id in `ids` exists under `owner_id`.
///
/// Counts `{ id ∈ ids, owner_id }` matches over the deduplicated set and
/// succeeds iff the count equals the set size — "doesn't exist" and
/// "belongs to another user" are indistinguishable by design.
pub async fn validate_ownership(
    store: &dyn ReferenceStore,
    ids: &[Uuid],
    owner_id: Uuid,
    kind: EntityKind,
) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut unique: Vec<Uuid> = Vec::with_capacity(ids.len());
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if seen.insert(*id) {
            unique.push(*id);
        }
    }

    let owned = store.count_owned(&unique, owner_id).await?;
    if owned == unique.len() {
        Ok(())
    } else {
        debug!(
            component = "reconcile",
            op = "validate_ownership",
            kind = kind.as_str(),
            requested = unique.len(),
            owned,
            "reference set failed ownership validation"
        );
        Err(Error::InvalidReference(kind))
    }
}

/// Reconciles reference descriptors for one entity kind.
#[derive(Clone)]
pub struct ReferenceReconciler {
    kind: EntityKind,
    store: Arc<dyn ReferenceStore>,
}

impl ReferenceReconciler {
    pub fn new(kind: EntityKind, store: Arc<dyn ReferenceStore>) -> Self {
        Self { kind, store }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Resolve `refs` to a canonical id list under `owner_id`.
    ///
    /// `None` means "no change requested" and passes through; `Some(vec![])`
    /// means "clear all references" and resolves to an empty list.
    pub async fn reconcile(
        &self,
        refs: Option<Vec<RefInput>>,
        owner_id: Uuid,
    ) -> Result<Option<Vec<Uuid>>> {
        let Some(refs) = refs else {
            return Ok(None);
        };

        let mut existing: Vec<Uuid> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        for r in &refs {
            match (r.id.as_deref(), r.name.as_deref()) {
                (Some(id), _) => existing.push(ident::parse_id(id)?),
                (None, Some(name)) if !name.trim().is_empty() => {
                    names.push(name.trim().to_string());
                }
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "each `{}s` entry needs an `id` or a `name`",
                        self.kind
                    )))
                }
            }
        }

        validate_ownership(self.store.as_ref(), &existing, owner_id, self.kind).await?;

        let resolved = if names.is_empty() {
            Vec::new()
        } else {
            self.store.find_or_create(owner_id, &names).await?
        };

        // Existing-then-created, first occurrence wins.
        let mut out: Vec<Uuid> = Vec::with_capacity(existing.len() + resolved.len());
        let mut seen = HashSet::with_capacity(existing.len() + resolved.len());
        for id in existing.into_iter().chain(resolved) {
            if seen.insert(id) {
                out.push(id);
            }
        }

        debug!(
            component = "reconcile",
            op = "reconcile",
            kind = self.kind.as_str(),
            resolved = out.len(),
            "reconciled reference set"
        );
        Ok(Some(out))
    }
}
