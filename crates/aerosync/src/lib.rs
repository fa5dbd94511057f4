//! Live design sync with a remote geometry engine.
//!
//! aerosync keeps a parametric aircraft design in step with an engine that
//! turns each design snapshot into a preview mesh.
//!
//! # Crate Structure
//!
//! - [`frame`]: binary mesh and error frame codec
//! - [`transport`]: reconnecting link to the engine
//! - [`design`]: design snapshots, field catalog and undo/redo history
//! - [`sync`]: the sync engine tying edits, sends and inbound frames together

/// Re-export frame types.
pub mod frame {
    pub use aerosync_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use aerosync_transport::*;
}

/// Re-export design types.
pub mod design {
    pub use aerosync_design::*;
}

/// Re-export sync engine types.
pub mod sync {
    pub use aerosync_sync::*;
}

pub use aerosync_design::{ChangeSource, DesignSnapshot, FieldValue};
pub use aerosync_sync::{SyncConfig, SyncHandle, SyncView};
pub use aerosync_transport::{ConnectionConfig, ConnectionState, WsConnector};
