//! Binary frame codec for the live geometry preview stream.
//!
//! The geometry engine answers every design snapshot with one binary frame:
//! - a mesh frame (type 1) carrying vertex positions, normals and face
//!   indices followed by a JSON trailer of derived values and warnings
//! - an error frame (type 2) carrying a JSON error record
//!
//! All integers are little-endian. Decoded arrays borrow the inbound buffer.

pub mod array;
pub mod codec;
pub mod error;
pub mod kind;
pub mod trailer;

pub use array::{F32Array, LeArray, LeScalar, U32Array};
pub use codec::{
    decode_frame, decode_frame_with_config, encode_error_frame, encode_mesh_frame, ErrorFrame,
    Frame, FrameConfig, MeshFrame, DEFAULT_MAX_FRAME_SIZE, MESH_HEADER_SIZE, TYPE_SIZE,
};
pub use error::{FrameError, Result};
pub use kind::{kind_name, ERROR, MESH};
pub use trailer::{DerivedValues, Trailer, ValidationWarning, WarningLevel};
