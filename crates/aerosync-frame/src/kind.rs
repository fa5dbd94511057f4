//! Frame message types.
//!
//! The first little-endian `u32` of every frame selects its layout.

/// Mesh update: counts, arrays, then a JSON trailer.
pub const MESH: u32 = 1;

/// Engine-side failure for the most recent snapshot.
pub const ERROR: u32 = 2;

/// Returns a human-readable name for a message type.
pub fn kind_name(kind: u32) -> &'static str {
    match kind {
        MESH => "MESH",
        ERROR => "ERROR",
        _ => "UNKNOWN",
    }
}
