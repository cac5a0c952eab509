use std::path::PathBuf;

use super::snapshot::Snapshot;

/// Storage abstraction so lifecycle operations can be exercised in isolation.
/// Implementations persist the whole snapshot; partial saves are not allowed.
pub trait PersistenceGateway: Send + Sync {
    fn load(&self) -> Result<Snapshot, PersistenceError>;
    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError>;
}

/// Error enumeration for gateway failures.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("i/o failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid CSV data in {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("{file} row {row}: invalid {field}: {detail}")]
    Malformed {
        file: &'static str,
        row: usize,
        field: &'static str,
        detail: String,
    },
    #[error("{nric} holds roles [{roles}], which no person table can represent")]
    UnrepresentableRoles { nric: String, roles: String },
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}
