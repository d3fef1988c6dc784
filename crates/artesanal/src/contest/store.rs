use super::entry::{Entry, EntryDetails, EntryId, TrackingCode};

/// Storage abstraction for persisted entries.
///
/// `create` is the single serialization point for tracking-code
/// uniqueness: implementations must assign the id and submission timestamp
/// and check the code atomically, rejecting the second of two colliding
/// concurrent inserts with [`StoreError::ConstraintViolation`]. Codes stay
/// reserved forever, including after deletion.
pub trait EntryStore: Send + Sync {
    /// Persist a new entry, assigning its id and submission timestamp.
    fn create(&self, details: EntryDetails) -> Result<Entry, StoreError>;
    /// Fetch a single entry; `Ok(None)` on a miss.
    fn get(&self, id: EntryId) -> Result<Option<Entry>, StoreError>;
    /// Snapshot of all entries ordered by id ascending.
    fn list_all(&self) -> Result<Vec<Entry>, StoreError>;
    /// Permanently remove an entry. The tracking code is not freed.
    fn delete(&self, id: EntryId) -> Result<(), StoreError>;
    /// Whether a code has ever been issued. Used by the allocator only.
    fn exists_by_code(&self, code: &TrackingCode) -> Result<bool, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("tracking code already exists")]
    ConstraintViolation,
    #[error("entry not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
