use std::path::Path;

use fsindex_common::{Result, error::Error};
use fsindex_fsas::Backend;
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const POSTINGS_FILE: &str = "postings.fsas";
pub const DICTIONARY_FILE: &str = "dictionary.fsas";
pub const TERMS_FILE: &str = "terms.fsas";

pub const SCHEMA_VERSION: u32 = 1;

/// Counters collected while building an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildStats {
    /// (term, document) pairs ingested, duplicates included.
    pub pairs: u64,
    /// Terms committed to the dictionary.
    pub terms: u64,
    /// Document ids committed across all posting lists.
    pub postings: u64,
    /// Terms dropped by the minimum frequency filter.
    pub terms_dropped: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub file: String,
    pub width: u32,
    pub len: u64,
}

/// The `manifest.json` written next to the stores of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub schema_version: u32,
    /// Backend the index was written with. Any backend can read it back.
    pub backend: Backend,
    pub postings: StoreInfo,
    pub dictionary: StoreInfo,
    pub terms: StoreInfo,
    pub stats: BuildStats,
}

impl IndexManifest {
    pub fn load(dir: &Path) -> Result<IndexManifest> {
        let path = dir.join(MANIFEST_FILE);
        let element = path.display().to_string();
        let json = std::fs::read(&path).map_err(|e| Error::io(element.clone(), e))?;
        let manifest: IndexManifest = serde_json::from_slice(&json)
            .map_err(|e| Error::invalid_format(element.clone(), e.to_string()))?;
        if manifest.schema_version != SCHEMA_VERSION {
            return Err(Error::schema_mismatch(
                element,
                format!(
                    "schema version {}, expected {SCHEMA_VERSION}",
                    manifest.schema_version
                ),
            ));
        }
        Ok(manifest)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(MANIFEST_FILE);
        let element = path.display().to_string();
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::invalid_format(element.clone(), e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| Error::io(element, e))
    }
}
