use std::path::Path;

use tracing::{error, info};

use crate::{
    catalog::{Catalog, Category},
    error::{Error, Result},
    filter::FilterState,
    identity::{InvalidKey, ItemIdentity},
    search::{View, recompute},
    selection::SelectionSet,
    store::KeyValueStore,
};

/// How a user names the venue to toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueRef {
    /// An identity key as rendered next to each row.
    Key(String),
    /// An abbreviation, optionally narrowed down.
    Abbreviation {
        abbreviation: String,
        field: Option<String>,
        category: Option<Category>,
    },
}

/// The loaded catalog and the selection that goes with it.
#[derive(Debug)]
pub struct Session<S> {
    catalog: Catalog,
    load_error: Option<String>,
    selection: SelectionSet<S>,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(catalog: Catalog, store: S) -> Self {
        Self {
            catalog,
            load_error: None,
            selection: SelectionSet::load(store),
        }
    }

    /// Load the catalog at `path`.
    ///
    /// A document that cannot be read or parsed leaves the session with an
    /// empty catalog and records the error so every view can show it.
    pub fn open(path: &Path, store: S) -> Self {
        match Catalog::load(path) {
            Ok(catalog) => {
                info!(
                    path = %path.display(),
                    entries = catalog.len(),
                    "catalog ready"
                );
                Self::new(catalog, store)
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "failed to load catalog"
                );
                Self {
                    load_error: Some(format!("{}: {e}", path.display())),
                    ..Self::new(Catalog::empty(), store)
                }
            }
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn selection(&self) -> &SelectionSet<S> {
        &self.selection
    }

    /// Selected venues that the loaded catalog still lists.
    pub fn selected_count(&self) -> usize {
        self.selection.summary(&self.catalog).len()
    }

    /// Run the reducer for the current controls.
    pub fn view(&self, filter: &FilterState) -> View<'_> {
        let mut view = recompute(&self.catalog, filter, &self.selection);
        view.load_error = self.load_error.clone();
        view
    }

    /// Find the one catalog entry `venue` refers to.
    pub fn resolve(&self, venue: &VenueRef) -> Result<ItemIdentity> {
        match venue {
            VenueRef::Key(key) => {
                let identity: ItemIdentity = key
                    .parse()
                    .map_err(|e: InvalidKey| Error::Config(e.to_string()))?;
                self.catalog
                    .find(&identity)
                    .map(|e| e.identity())
                    .ok_or_else(|| Error::NotFound {
                        kind: "venue",
                        name: key.clone(),
                    })
            }
            VenueRef::Abbreviation {
                abbreviation,
                field,
                category,
            } => self
                .catalog
                .resolve(abbreviation, field.as_deref(), *category)
                .map(|e| e.identity()),
        }
    }

    /// Toggle the referenced venue; returns it and whether it is now selected.
    ///
    /// A key that is already selected is removed even when the catalog no
    /// longer lists it.
    pub fn toggle(
        &mut self,
        venue: &VenueRef,
    ) -> Result<(ItemIdentity, bool)> {
        let identity = match venue {
            VenueRef::Key(key) => match key.parse::<ItemIdentity>() {
                Ok(identity) if self.selection.contains(&identity) => identity,
                _ => self.resolve(venue)?,
            },
            VenueRef::Abbreviation { .. } => self.resolve(venue)?,
        };
        let selected = self.selection.toggle(identity.clone())?;
        info!(key = %identity, selected, "toggled selection");
        Ok((identity, selected))
    }

    pub fn clear_selection(&mut self) -> Result<()> {
        self.selection.clear()
    }
}
