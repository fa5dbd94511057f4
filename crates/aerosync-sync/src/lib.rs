//! Keeps the geometry engine in step with the local design.
//!
//! A [`SyncHandle`] runs one engine task that owns the [`DesignStore`],
//! applies edits, and decides when each edit is transmitted according to
//! its [`ChangeSource`](aerosync_design::ChangeSource):
//!
//! | source      | policy                                                   |
//! |-------------|----------------------------------------------------------|
//! | `immediate` | sent on every change                                     |
//! | `drag`      | leading edge sent, then the latest value once per window |
//! | `text`      | sent once after a quiet period                           |
//!
//! Inbound frames update the mesh, derived values and warnings but never
//! schedule a send.

pub mod config;
pub mod engine;
pub mod error;
pub mod status;
pub mod store;
pub mod timing;
pub mod view;

pub use config::SyncConfig;
pub use engine::SyncHandle;
pub use error::{Result, SyncError};
pub use status::GenerationStatus;
pub use store::{Commit, DesignStore};
pub use timing::{Debounce, Throttle};
pub use view::SyncView;
