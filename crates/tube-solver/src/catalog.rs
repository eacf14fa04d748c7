//! Persisted catalog of solved layouts, grouped by puzzle class.
//!
//! On disk the catalog is JSON:
//!
//! ```json
//! { "classes": [ { "class": { "colors": 3, "capacity": 3, "empty": 2 },
//!                  "entries": [ { "layout": [[0,1,2],[2,1,0],[1,0,2],[],[]], "steps": 9 } ] } ] }
//! ```
//!
//! Entries are kept in sets, so re-adding a layout with the same step count
//! is a no-op and the file order is stable.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::puzzle::{Layout, PuzzleClass};

/// A solvable layout and the length of the solution the search found for it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub layout: Layout,
    pub steps: usize,
}

/// One class worth of entries, as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogGroup {
    class: PuzzleClass,
    entries: BTreeSet<CatalogEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    classes: Vec<CatalogGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CatalogFile", into = "CatalogFile")]
pub struct Catalog {
    groups: BTreeMap<PuzzleClass, BTreeSet<CatalogEntry>>,
}

impl From<CatalogFile> for Catalog {
    fn from(file: CatalogFile) -> Self {
        let mut catalog = Catalog::default();
        for group in file.classes {
            catalog.groups.entry(group.class).or_default().extend(group.entries);
        }
        catalog
    }
}

impl From<Catalog> for CatalogFile {
    fn from(catalog: Catalog) -> Self {
        CatalogFile {
            classes: catalog
                .groups
                .into_iter()
                .map(|(class, entries)| CatalogGroup { class, entries })
                .collect(),
        }
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load `path` if it exists, otherwise start empty.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Record a solved layout. Returns false if it was already present.
    pub fn insert(&mut self, class: PuzzleClass, entry: CatalogEntry) -> bool {
        self.groups.entry(class).or_default().insert(entry)
    }

    /// Make sure `class` has a group, even if nothing gets accepted for it.
    pub fn ensure_class(&mut self, class: PuzzleClass) {
        self.groups.entry(class).or_default();
    }

    pub fn entries(&self, class: &PuzzleClass) -> impl Iterator<Item = &CatalogEntry> {
        self.groups.get(class).into_iter().flatten()
    }

    pub fn class_len(&self, class: &PuzzleClass) -> usize {
        self.groups.get(class).map_or(0, BTreeSet::len)
    }

    pub fn classes(&self) -> impl Iterator<Item = &PuzzleClass> {
        self.groups.keys()
    }

    /// Entries across all classes
    pub fn total(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }
}
