use serde::{Deserialize, Serialize};

use vendora_core::{DomainError, DomainResult, ValueObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationKind {
    Warehouse,
    Store,
    Other,
}

/// Where a stock is held. Two locations are the same place when their codes
/// match, whatever their display names.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Location {
    name: String,
    code: String,
    kind: LocationKind,
}

impl Location {
    pub fn new(name: &str, code: &str, kind: LocationKind) -> DomainResult<Self> {
        let name = name.trim();
        let code = code.trim();
        if name.is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }
        if code.is_empty() {
            return Err(DomainError::validation("location code cannot be empty"));
        }
        Ok(Self {
            name: name.to_string(),
            code: code.to_uppercase(),
            kind,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn kind(&self) -> LocationKind {
        self.kind
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl ValueObject for Location {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_upper_cased_and_drives_equality() {
        let a = Location::new(" Main warehouse ", " wh-01 ", LocationKind::Warehouse).unwrap();
        let b = Location::new("Overflow", "WH-01", LocationKind::Other).unwrap();
        assert_eq!(a.code(), "WH-01");
        assert_eq!(a.name(), "Main warehouse");
        assert_eq!(a, b);
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(Location::new("", "X", LocationKind::Store).is_err());
        assert!(Location::new("Shop", "  ", LocationKind::Store).is_err());
    }
}
