//! Document addressing.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const SEPARATOR: char = '$';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("document key {0} must not be empty")]
    Empty(&'static str),
    #[error("document key part {0:?} must not contain '$'")]
    Separator(String),
    #[error("combined document key {0:?} has no '$' separator")]
    MissingSeparator(String),
}

/// `(collection, document)` pair naming one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    collection: String,
    document: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, document: impl Into<String>) -> Result<Self, KeyError> {
        let collection = collection.into();
        let document = document.into();
        for (name, part) in [("collection", &collection), ("document", &document)] {
            if part.is_empty() {
                return Err(KeyError::Empty(name));
            }
            if part.contains(SEPARATOR) {
                return Err(KeyError::Separator(part.clone()));
            }
        }
        Ok(Self {
            collection,
            document,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    /// `collection$document`.
    pub fn combined(&self) -> String {
        format!("{}{}{}", self.collection, SEPARATOR, self.document)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.collection, SEPARATOR, self.document)
    }
}

impl FromStr for DocumentKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (collection, document) = s
            .split_once(SEPARATOR)
            .ok_or_else(|| KeyError::MissingSeparator(s.to_string()))?;
        DocumentKey::new(collection, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_round_trip() {
        let key = DocumentKey::new("notes", "today").unwrap();
        assert_eq!(key.combined(), "notes$today");
        assert_eq!("notes$today".parse::<DocumentKey>().unwrap(), key);
    }

    #[test]
    fn rejects_bad_parts() {
        assert_eq!(DocumentKey::new("", "d"), Err(KeyError::Empty("collection")));
        assert_eq!(DocumentKey::new("c", ""), Err(KeyError::Empty("document")));
        assert!(matches!(
            "a$b$c".parse::<DocumentKey>(),
            Err(KeyError::Separator(_))
        ));
        assert!(matches!(
            "plain".parse::<DocumentKey>(),
            Err(KeyError::MissingSeparator(_))
        ));
    }
}
