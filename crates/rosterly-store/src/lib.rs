//! Record store for the Rosterly student-records manager.
//!
//! Owns the on-disk JSON document (top-level `users` and `students` arrays),
//! keeps the entire dataset in memory, and rewrites the file wholesale on
//! every mutation. There is no indexing, no transaction boundary, and no
//! multi-process coordination: the last `save` wins with a full-document
//! overwrite. That is an accepted limitation of the design, not a guarantee
//! to build on.
//!
//! All student operations are keyed by the owning user's id; a lookup with
//! the wrong owner behaves exactly like a lookup for a record that does not
//! exist.

mod error;
mod model;
mod store;


pub use error::StoreError;
pub use model::{Dataset, NewStudent, Student, StudentUpdate, User};
pub use store::RecordStore;
