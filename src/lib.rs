//! glhm - XBRL Global Ledger taxonomy flattener
//!
//! Loads the XBRL-GL schema modules and label linkbases, walks the tuple
//! hierarchy into a flat Logical Hierarchical Model (LHM), flattens
//! instance documents into tidy CSV (with optional xBRL-CSV metadata) and
//! reshapes tidy tables into nested JSON and back.
//!
//! Licensed under AGPL-3.0

pub mod class_table;
pub mod config;
pub mod hierarchy;
pub mod instance;
pub mod linkbase;
pub mod metadata;
pub mod model;
pub mod namespaces;
pub mod output;
pub mod schema;
pub mod tidy;
pub mod xml;

#[cfg(test)]
mod testing;

// Re-export main types
pub use class_table::{build_class_table, ClassRow};
pub use config::{Encoding, TaxonomyConfig};
pub use hierarchy::{HierarchyWalker, Lhm, WalkReport};
pub use instance::{Flattener, InstanceParser};
pub use linkbase::{LabelMap, LabelResolver};
pub use metadata::{build_metadata, MetadataOptions};
pub use model::{DimensionedRow, InstanceTree, InstanceValue, LabelRecord, LhmRow, MaxOccurs};
pub use schema::{SchemaLoader, SchemaSet};
pub use tidy::{TidyParams, TidyTable, TidyTransform};

use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing {role} file: {}", path.display())]
    InputMissing { role: &'static str, path: PathBuf },

    #[error("Malformed XML in {} at byte {position}: {message}", path.display())]
    MalformedXml {
        path: PathBuf,
        position: u64,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Structure violation at row {row}: expected {expected}, observed {observed}")]
    StructureViolation {
        row: usize,
        expected: String,
        observed: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn malformed(path: &Path, position: u64, message: impl Into<String>) -> Self {
        Error::MalformedXml {
            path: path.to_path_buf(),
            position,
            message: message.into(),
        }
    }
}

/// Fails with [`Error::InputMissing`] unless `path` is an existing file.
pub fn require_file(role: &'static str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::InputMissing {
            role,
            path: path.to_path_buf(),
        })
    }
}

/// Strips a leading UTF-8 byte-order mark.
pub(crate) fn skip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}
