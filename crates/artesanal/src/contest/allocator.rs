use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::entry::TrackingCode;
use super::store::{EntryStore, StoreError};

/// Hard ceiling on candidate draws per allocation. The ~10,000-value
/// keyspace is expected to stay sparse; hitting this limit means the space
/// is near exhaustion and needs operator attention.
pub const MAX_ATTEMPTS: usize = 50;

/// Draws candidate tracking codes and checks them against the store.
///
/// Stateless apart from its RNG. The existence check is advisory only: two
/// workers can pass it with the same candidate, so the store's `create`
/// remains the authority and callers must be prepared to redraw on
/// [`StoreError::ConstraintViolation`].
pub struct CodeAllocator {
    rng: Mutex<StdRng>,
    max_attempts: usize,
}

impl CodeAllocator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Seedable constructor so tests can force specific draw sequences.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Allocate a code not yet present in the store.
    pub fn allocate(&self, store: &dyn EntryStore) -> Result<TrackingCode, AllocationError> {
        for _ in 0..self.max_attempts {
            let number: u16 = {
                let mut rng = self.rng.lock().expect("allocator rng poisoned");
                rng.gen_range(0..10_000)
            };
            let candidate = TrackingCode::from_number(number);
            if !store.exists_by_code(&candidate)? {
                return Ok(candidate);
            }
        }
        Err(AllocationError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

impl Default for CodeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("tracking code space exhausted after {attempts} attempts")]
    Exhausted { attempts: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}
