//! Selection of the GET `/records` lookup from its query string.

use serde::Deserialize;

/// Raw `?id=` / `?name=` parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordQuery {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Which store lookup a GET request maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    All,
    ById(String),
    ByName(String),
}

impl RecordQuery {
    /// `id` takes precedence over `name`; empty values count as absent.
    pub fn lookup(self) -> Lookup {
        match (non_empty(self.id), non_empty(self.name)) {
            (Some(id), _) => Lookup::ById(id),
            (None, Some(name)) => Lookup::ByName(name),
            (None, None) => Lookup::All,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
