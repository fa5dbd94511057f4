use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::array::{F32Array, U32Array};
use crate::error::{FrameError, Result};
use crate::kind::{ERROR, MESH};
use crate::trailer::{DerivedValues, Trailer, ValidationWarning};

/// Message-type prefix shared by every frame.
pub const TYPE_SIZE: usize = 4;

/// Mesh header: type (4) + vertex count (4) + face count (4) = 12 bytes.
pub const MESH_HEADER_SIZE: usize = 12;

/// Default maximum inbound frame size: 256 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 256 * 1024 * 1024;

/// Bytes per vertex (or normal, or face): three 4-byte scalars.
const TRIPLE_SIZE: usize = 12;

/// A decoded inbound frame.
#[derive(Debug, Clone)]
pub enum Frame {
    Mesh(MeshFrame),
    Error(ErrorFrame),
}

/// A mesh update. The arrays alias the buffer the frame was decoded from.
#[derive(Debug, Clone)]
pub struct MeshFrame {
    pub vertex_count: u32,
    pub face_count: u32,
    /// `vertex_count * 3` positions.
    pub vertices: F32Array,
    /// `vertex_count * 3` normals.
    pub normals: F32Array,
    /// `face_count * 3` vertex indices.
    pub indices: U32Array,
    pub derived: DerivedValues,
    pub validation: Vec<ValidationWarning>,
}

/// The engine rejected the most recent snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFrame {
    pub error: String,
    #[serde(default)]
    pub detail: String,
    /// Design field the failure is attributed to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Configuration for frame decoding.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum accepted frame size in bytes. Default: 256 MiB.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Decode one frame using the default configuration.
pub fn decode_frame(src: Bytes) -> Result<Frame> {
    decode_frame_with_config(src, &FrameConfig::default())
}

/// Decode one frame.
///
/// Wire format:
/// ```text
/// mesh:  ┌──────────┬──────────┬──────────┬────────────┬────────────┬────────────┬──────────────┐
///        │ type=1   │ N (4B LE)│ M (4B LE)│ N*3 f32    │ N*3 f32    │ M*3 u32    │ JSON trailer │
///        │ (4B LE)  │          │          │ positions  │ normals    │ indices    │ (to EOF)     │
///        └──────────┴──────────┴──────────┴────────────┴────────────┴────────────┴──────────────┘
/// error: ┌──────────┬───────────────────────────────┐
///        │ type=2   │ JSON {error, detail, field?}  │
///        └──────────┴───────────────────────────────┘
/// ```
///
/// Structural problems are rejected outright; no partial frame is returned.
/// A missing trailer decodes to zeroed derived values and no warnings.
pub fn decode_frame_with_config(src: Bytes, config: &FrameConfig) -> Result<Frame> {
    if src.len() > config.max_frame_size {
        return Err(FrameError::TooLarge {
            size: src.len(),
            max: config.max_frame_size,
        });
    }
    if src.len() < TYPE_SIZE {
        return Err(FrameError::TooShort {
            len: src.len(),
            min: TYPE_SIZE,
        });
    }

    match read_u32(&src, 0) {
        MESH => decode_mesh(src).map(Frame::Mesh),
        ERROR => decode_error(&src).map(Frame::Error),
        other => Err(FrameError::UnknownType(other)),
    }
}

fn decode_mesh(src: Bytes) -> Result<MeshFrame> {
    if src.len() < MESH_HEADER_SIZE {
        return Err(FrameError::TooShort {
            len: src.len(),
            min: MESH_HEADER_SIZE,
        });
    }

    let vertex_count = read_u32(&src, 4);
    let face_count = read_u32(&src, 8);

    let truncated = || FrameError::Truncated {
        needed: usize::MAX,
        len: src.len(),
    };
    let vertex_bytes = (vertex_count as usize)
        .checked_mul(TRIPLE_SIZE)
        .ok_or_else(truncated)?;
    let face_bytes = (face_count as usize)
        .checked_mul(TRIPLE_SIZE)
        .ok_or_else(truncated)?;
    let normals_start = MESH_HEADER_SIZE
        .checked_add(vertex_bytes)
        .ok_or_else(truncated)?;
    let indices_start = normals_start
        .checked_add(vertex_bytes)
        .ok_or_else(truncated)?;
    let arrays_end = indices_start
        .checked_add(face_bytes)
        .ok_or_else(truncated)?;

    if arrays_end > src.len() {
        return Err(FrameError::Truncated {
            needed: arrays_end,
            len: src.len(),
        });
    }

    let trailer = parse_trailer(&src[arrays_end..])?;

    Ok(MeshFrame {
        vertex_count,
        face_count,
        vertices: F32Array::new(src.slice(MESH_HEADER_SIZE..normals_start)),
        normals: F32Array::new(src.slice(normals_start..indices_start)),
        indices: U32Array::new(src.slice(indices_start..arrays_end)),
        derived: trailer.derived,
        validation: trailer.validation,
    })
}

fn parse_trailer(raw: &[u8]) -> Result<Trailer> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Trailer::default());
    }
    serde_json::from_slice(raw).map_err(FrameError::InvalidTrailer)
}

fn decode_error(src: &[u8]) -> Result<ErrorFrame> {
    serde_json::from_slice(&src[TYPE_SIZE..]).map_err(FrameError::InvalidErrorPayload)
}

fn read_u32(src: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        src[offset],
        src[offset + 1],
        src[offset + 2],
        src[offset + 3],
    ])
}

/// Encode a mesh frame.
///
/// `vertices` and `normals` hold `[x, y, z]` triples flattened; `indices`
/// holds face triples flattened. The trailer is omitted when `None`.
pub fn encode_mesh_frame(
    vertices: &[f32],
    normals: &[f32],
    indices: &[u32],
    trailer: Option<&Trailer>,
    dst: &mut BytesMut,
) -> Result<()> {
    if vertices.len() % 3 != 0 {
        return Err(FrameError::InconsistentMesh(format!(
            "{} position scalars is not a multiple of 3",
            vertices.len()
        )));
    }
    if normals.len() != vertices.len() {
        return Err(FrameError::InconsistentMesh(format!(
            "{} normal scalars for {} position scalars",
            normals.len(),
            vertices.len()
        )));
    }
    if indices.len() % 3 != 0 {
        return Err(FrameError::InconsistentMesh(format!(
            "{} index scalars is not a multiple of 3",
            indices.len()
        )));
    }
    let vertex_count = u32::try_from(vertices.len() / 3)
        .map_err(|_| FrameError::InconsistentMesh("vertex count exceeds u32".to_string()))?;
    let face_count = u32::try_from(indices.len() / 3)
        .map_err(|_| FrameError::InconsistentMesh("face count exceeds u32".to_string()))?;

    let trailer_json = match trailer {
        Some(trailer) => serde_json::to_vec(trailer).map_err(FrameError::InvalidTrailer)?,
        None => Vec::new(),
    };

    dst.reserve(MESH_HEADER_SIZE + (vertices.len() * 2 + indices.len()) * 4 + trailer_json.len());
    dst.put_u32_le(MESH);
    dst.put_u32_le(vertex_count);
    dst.put_u32_le(face_count);
    for v in vertices {
        dst.put_f32_le(*v);
    }
    for n in normals {
        dst.put_f32_le(*n);
    }
    for i in indices {
        dst.put_u32_le(*i);
    }
    dst.put_slice(&trailer_json);
    Ok(())
}

/// Encode an error frame.
pub fn encode_error_frame(frame: &ErrorFrame, dst: &mut BytesMut) -> Result<()> {
    let body = serde_json::to_vec(frame).map_err(FrameError::InvalidErrorPayload)?;
    dst.reserve(TYPE_SIZE + body.len());
    dst.put_u32_le(ERROR);
    dst.put_slice(&body);
    Ok(())
}
