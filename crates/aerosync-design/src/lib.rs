//! Design state for the aerosync client.
//!
//! - [`field`]: the catalog of editable design fields
//! - [`snapshot`]: immutable-by-convention copies of the whole design
//! - [`source`]: which interaction produced a mutation
//! - [`history`]: undo/redo stacks with no-op filtering and gesture pausing

pub mod error;
pub mod field;
pub mod history;
pub mod snapshot;
pub mod source;

pub use error::{DesignError, Result};
pub use field::{field, FieldGroup, FieldKind, FieldSpec, FIELDS};
pub use history::{HistoryEntry, HistoryStore, Offer, DEFAULT_HISTORY_CAPACITY};
pub use snapshot::{DesignPayload, DesignSnapshot, FieldValue};
pub use source::ChangeSource;
