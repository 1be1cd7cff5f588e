//! Product identifiers.
//!
//! The remote catalog is not strict about identifier types: some entries carry
//! string ids, others plain numbers. Both are normalized to their string form
//! so that `"7"` and `7` refer to the same product.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`ProductId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductIdError {
    /// The input is empty or only whitespace.
    #[error("product id cannot be empty")]
    Empty,
}

/// Identifier of a catalog product.
///
/// ## Examples
///
/// ```
/// use innovatemart_core::ProductId;
///
/// assert!(ProductId::parse("cyber-car").is_ok());
/// assert!(ProductId::parse("   ").is_err());
///
/// let id: ProductId = serde_json::from_str("42").unwrap();
/// assert_eq!(id.as_str(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Parse a `ProductId` from user input (form fields, query strings).
    ///
    /// Surrounding whitespace is trimmed, as it is for catalog ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty.
    pub fn parse(s: &str) -> Result<Self, ProductIdError> {
        let id = Self::from(s);
        if id.is_empty() {
            return Err(ProductIdError::Empty);
        }
        Ok(id)
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for an id that was blank before trimming.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_owned())
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self::from(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}
