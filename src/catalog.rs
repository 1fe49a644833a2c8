use std::{fmt, path::Path, str::FromStr};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    identity::ItemIdentity,
};

/// Top-level key of the catalog document.
const FIELDS_KEY: &str = "fieldsOfStudy";

/// Which of a field's two collections an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Journal,
    Conference,
}

impl Category {
    /// Enumeration order within a field.
    pub const ALL: [Category; 2] = [Category::Journal, Category::Conference];

    pub fn name(self) -> &'static str {
        match self {
            Category::Journal => "Journal",
            Category::Conference => "Conference",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "journal" | "journals" => Ok(Category::Journal),
            "conference" | "conferences" => Ok(Category::Conference),
            other => Err(format!(
                "unknown category '{other}' (expected journal or conference)"
            )),
        }
    }
}

/// One venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub abbreviation: String,
    pub full_name: String,
    pub url: String,
    pub publisher: String,
    pub notes: Option<String>,
}

/// The entries of one rank label, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankBucket {
    pub rank: String,
    pub entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub journals: Vec<RankBucket>,
    pub conferences: Vec<RankBucket>,
}

impl Field {
    pub fn buckets(&self, category: Category) -> &[RankBucket] {
        match category {
            Category::Journal => &self.journals,
            Category::Conference => &self.conferences,
        }
    }
}

/// A catalog entry together with the context it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRef<'a> {
    pub field: &'a str,
    pub category: Category,
    pub rank: &'a str,
    pub entry: &'a CatalogEntry,
}

impl EntryRef<'_> {
    pub fn identity(&self) -> ItemIdentity {
        ItemIdentity::new(&self.entry.abbreviation, self.category, self.field)
    }

    /// Compare against an identity without allocating one.
    pub fn has_identity(&self, identity: &ItemIdentity) -> bool {
        identity.abbreviation() == self.entry.abbreviation
            && identity.category() == self.category
            && identity.field() == self.field
    }
}

/// The loaded venue catalog. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    fields: Vec<Field>,
}

impl Catalog {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Read and validate a catalog document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&text)?;
        debug!(
            path = %path.display(),
            fields = catalog.fields.len(),
            entries = catalog.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Parse a catalog document.
    ///
    /// The document must be an object with a `fieldsOfStudy` array. Fields,
    /// rank mappings and entries that do not have the expected shape are
    /// dropped with a warning rather than failing the whole load.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(text)?;
        let raw_fields = doc
            .get(FIELDS_KEY)
            .ok_or_else(|| Error::Catalog(format!("missing '{FIELDS_KEY}'")))?
            .as_array()
            .ok_or_else(|| {
                Error::Catalog(format!("'{FIELDS_KEY}' is not an array"))
            })?;

        let fields = raw_fields
            .iter()
            .enumerate()
            .filter_map(|(idx, raw)| parse_field(idx, raw))
            .collect();

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Walk every entry in catalog order: fields, then journals before
    /// conferences, then rank buckets, then entries within a bucket.
    pub fn entries(&self) -> impl Iterator<Item = EntryRef<'_>> {
        self.fields.iter().flat_map(|field| {
            Category::ALL.into_iter().flat_map(move |category| {
                field.buckets(category).iter().flat_map(move |bucket| {
                    bucket.entries.iter().map(move |entry| EntryRef {
                        field: &field.name,
                        category,
                        rank: &bucket.rank,
                        entry,
                    })
                })
            })
        })
    }

    pub fn find(&self, identity: &ItemIdentity) -> Option<EntryRef<'_>> {
        self.entries().find(|e| e.has_identity(identity))
    }

    /// Resolve an abbreviation to exactly one entry, optionally narrowed by
    /// field name and category.
    pub fn resolve(
        &self,
        abbreviation: &str,
        field: Option<&str>,
        category: Option<Category>,
    ) -> Result<EntryRef<'_>> {
        let matches: Vec<EntryRef<'_>> = self
            .entries()
            .filter(|e| e.entry.abbreviation == abbreviation)
            .filter(|e| field.is_none_or(|f| e.field == f))
            .filter(|e| category.is_none_or(|c| e.category == c))
            .collect();

        match matches.as_slice() {
            [] => Err(Error::NotFound {
                kind: "venue",
                name: abbreviation.to_string(),
            }),
            [single] => Ok(*single),
            many => Err(Error::Ambiguous {
                name: abbreviation.to_string(),
                count: many.len(),
            }),
        }
    }
}

fn parse_field(idx: usize, raw: &Value) -> Option<Field> {
    let Some(name) = raw.get("name").and_then(Value::as_str) else {
        warn!(index = idx, "dropping field without a string name");
        return None;
    };

    Some(Field {
        name: name.to_string(),
        journals: parse_category(name, "journals", raw.get("journals")),
        conferences: parse_category(
            name,
            "conferences",
            raw.get("conferences"),
        ),
    })
}

fn parse_category(
    field: &str,
    key: &str,
    raw: Option<&Value>,
) -> Vec<RankBucket> {
    let map: &Map<String, Value> = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            warn!(field, key, "dropping rank mapping that is not an object");
            return Vec::new();
        }
    };

    map.iter()
        .filter_map(|(rank, items)| {
            let Some(items) = items.as_array() else {
                warn!(
                    field,
                    key,
                    rank = %rank,
                    "dropping rank bucket that is not an array"
                );
                return None;
            };
            let entries = items
                .iter()
                .filter_map(|item| {
                    let entry = parse_entry(item);
                    if entry.is_none() {
                        warn!(
                            field,
                            key,
                            rank = %rank,
                            "dropping malformed entry"
                        );
                    }
                    entry
                })
                .collect();
            Some(RankBucket {
                rank: rank.clone(),
                entries,
            })
        })
        .collect()
}

fn parse_entry(raw: &Value) -> Option<CatalogEntry> {
    let text = |key: &str| raw.get(key)?.as_str().map(str::to_string);

    let notes = match raw.get("notes") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return None,
    };

    Some(CatalogEntry {
        abbreviation: text("abbreviation")?,
        full_name: text("fullName")?,
        url: text("url")?,
        publisher: text("publisher")?,
        notes,
    })
}
