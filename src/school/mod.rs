//! School records
//!
//! Classes and students as the lifecycle engine sees them, the store
//! contract it consumes, and two store implementations:
//! - `InMemorySchoolStore`: lock-protected maps, used by tests
//! - `JsonFileStore`: single JSON document with atomic rewrite on mutation

mod errors;
mod file;
mod memory;
mod model;
mod store;

pub use errors::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub(crate) use file::write_atomically;
pub use memory::{InMemorySchoolStore, SchoolDocument};
pub use model::{
    ClassId, ClassRecord, ClassSummary, DeleteOutcome, MoveOutcome, StudentId, StudentRecord,
    TeacherId,
};
pub use store::SchoolStore;
