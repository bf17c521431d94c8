//! Minimal per-module documentation records.
//!
//! Free-text comments are stripped on ingest to bound memory; only names and
//! type signatures survive.

use crate::error::{CoreError, Result};
use serde::Deserialize;

/// A named value or binary operator with its type signature, comment-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDoc {
    /// The value or operator name.
    pub name: String,
    /// Its type signature, verbatim.
    pub signature: String,
}

/// A minimal per-module documentation record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleDoc {
    /// Fully-qualified module name.
    pub name: String,
    /// Union type names exposed by this module.
    pub unions: Vec<String>,
    /// Type alias names exposed by this module.
    pub aliases: Vec<String>,
    /// Exposed values, name and signature only.
    pub values: Vec<ValueDoc>,
    /// Exposed binary operators, name and signature only.
    pub binops: Vec<ValueDoc>,
}

impl ModuleDoc {
    /// Parse the full `docs.json` array for a package, stripping every
    /// free-text comment field as it goes.
    ///
    /// # Errors
    /// Returns `CoreError::MalformedDocs` if the JSON doesn't match the
    /// expected shape.
    pub fn parse_all(text: &str) -> Result<Vec<Self>> {
        let raw: Vec<RawModuleDoc> =
            sonic_rs::from_str(text).map_err(|e| CoreError::MalformedDocs(e.to_string()))?;
        Ok(raw.into_iter().map(RawModuleDoc::into_stripped).collect())
    }
}

#[derive(Debug, Deserialize)]
struct RawModuleDoc {
    name: String,
    #[serde(default)]
    unions: Vec<RawUnion>,
    #[serde(default)]
    aliases: Vec<RawNamed>,
    #[serde(default)]
    values: Vec<RawSignature>,
    #[serde(default)]
    binops: Vec<RawSignature>,
}

impl RawModuleDoc {
    fn into_stripped(self) -> ModuleDoc {
        ModuleDoc {
            name: self.name,
            unions: self.unions.into_iter().map(|u| u.name).collect(),
            aliases: self.aliases.into_iter().map(|a| a.name).collect(),
            values: self.values.into_iter().map(RawSignature::into_value_doc).collect(),
            binops: self.binops.into_iter().map(RawSignature::into_value_doc).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawUnion {
    name: String,
    #[serde(default, rename = "comment")]
    _comment: String,
}

#[derive(Debug, Deserialize)]
struct RawNamed {
    name: String,
    #[serde(default, rename = "comment")]
    _comment: String,
}

#[derive(Debug, Deserialize)]
struct RawSignature {
    name: String,
    #[serde(default, rename = "type")]
    signature: String,
    #[serde(default, rename = "comment")]
    _comment: String,
}

impl RawSignature {
    fn into_value_doc(self) -> ValueDoc {
        ValueDoc {
            name: self.name,
            signature: self.signature,
        }
    }
}
