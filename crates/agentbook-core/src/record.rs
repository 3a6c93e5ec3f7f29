use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One normalized agent contact entry, as written to the snapshot.
///
/// Created once by the card parser, enriched with `region`, and immutable
/// afterwards. `name` + `phone` form the identity used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub site: String,
    pub tab: String,
    pub name: String,
    pub office: String,
    pub address: String,
    pub phone: String,
    pub fax: String,
    pub region: String,
}

impl Record {
    pub fn identity_key(name: &str, phone: &str) -> String {
        format!("{name}|{phone}")
    }
}

/// Run-scoped set of identity keys. Shared by reference across every site
/// and tab of one run; the first occurrence of a (name, phone) pair wins.
#[derive(Debug, Default)]
pub struct SeenSet(HashSet<String>);

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the identity. Returns `true` if it was not seen before.
    pub fn remember(&mut self, name: &str, phone: &str) -> bool {
        self.0.insert(Record::identity_key(name, phone))
    }

    pub fn contains(&self, name: &str, phone: &str) -> bool {
        self.0.contains(&Record::identity_key(name, phone))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
