use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::{
    catalog::{Catalog, EntryRef},
    error::Result,
    identity::ItemIdentity,
    store::KeyValueStore,
};

/// Storage key holding the serialized selection.
pub const SELECTION_KEY: &str = "selectedItems";

/// The user's bookmarked venues, written through to a [`KeyValueStore`].
///
/// Identities are ordered by abbreviation, then category, then field, so
/// the stored value depends only on membership. The store holds a JSON
/// array of identity keys while the set is non-empty and no entry at all
/// once it is empty.
#[derive(Debug)]
pub struct SelectionSet<S> {
    store: S,
    members: BTreeSet<ItemIdentity>,
}

impl<S: KeyValueStore> SelectionSet<S> {
    /// Restore the selection from `store`.
    ///
    /// Missing, unreadable, or malformed state yields an empty set.
    pub fn load(store: S) -> Self {
        let members = match store.get(SELECTION_KEY) {
            Ok(Some(raw)) => decode(&raw).unwrap_or_else(|| {
                warn!(
                    key = SELECTION_KEY,
                    "ignoring malformed selection state"
                );
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!(
                    key = SELECTION_KEY,
                    error = %e,
                    "could not read selection state"
                );
                BTreeSet::new()
            }
        };
        debug!(count = members.len(), "restored selection");
        Self { store, members }
    }

    pub fn contains(&self, identity: &ItemIdentity) -> bool {
        self.members.contains(identity)
    }

    pub fn all(&self) -> impl Iterator<Item = &ItemIdentity> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add `identity` if absent, remove it if present.
    ///
    /// Returns whether the identity is selected afterwards. If the store
    /// rejects the write, membership is left as it was.
    pub fn toggle(&mut self, identity: ItemIdentity) -> Result<bool> {
        let selected = if self.members.remove(&identity) {
            false
        } else {
            self.members.insert(identity.clone());
            true
        };

        if let Err(e) = self.persist() {
            if selected {
                self.members.remove(&identity);
            } else {
                self.members.insert(identity);
            }
            return Err(e);
        }
        Ok(selected)
    }

    /// Drop every selection and remove the stored key.
    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(SELECTION_KEY)?;
        self.members.clear();
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        if self.members.is_empty() {
            return self.store.remove(SELECTION_KEY);
        }
        let keys: Vec<String> =
            self.members.iter().map(ItemIdentity::key).collect();
        self.store.set(SELECTION_KEY, &serde_json::to_string(&keys)?)
    }

    /// Catalog entries whose identity is selected, sorted by abbreviation.
    ///
    /// Independent of any filter. Ties keep catalog order; selected
    /// identities that no longer exist in the catalog are skipped.
    pub fn summary<'a>(&self, catalog: &'a Catalog) -> Vec<EntryRef<'a>> {
        if self.members.is_empty() {
            return Vec::new();
        }
        let mut entries: Vec<EntryRef<'a>> = catalog
            .entries()
            .filter(|e| self.members.iter().any(|m| e.has_identity(m)))
            .collect();
        entries.sort_by(|a, b| a.entry.abbreviation.cmp(&b.entry.abbreviation));
        entries
    }
}

fn decode(raw: &str) -> Option<BTreeSet<ItemIdentity>> {
    let keys: Vec<String> = serde_json::from_str(raw).ok()?;
    keys.iter().map(|key| key.parse().ok()).collect()
}
