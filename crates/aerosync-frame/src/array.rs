use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;

/// A 4-byte little-endian scalar stored in a frame array.
pub trait LeScalar: Copy {
    fn from_le(bytes: [u8; 4]) -> Self;
}

impl LeScalar for f32 {
    fn from_le(bytes: [u8; 4]) -> Self {
        f32::from_le_bytes(bytes)
    }
}

impl LeScalar for u32 {
    fn from_le(bytes: [u8; 4]) -> Self {
        u32::from_le_bytes(bytes)
    }
}

/// A typed view over a slice of the inbound frame buffer.
///
/// The view shares the frame's allocation (`Bytes` is reference counted), so
/// the buffer is released once every view of a superseded frame is dropped.
/// Elements are decoded on access because the wire offsets carry no
/// alignment guarantee.
#[derive(Clone)]
pub struct LeArray<T> {
    bytes: Bytes,
    _marker: PhantomData<T>,
}

/// Vertex positions or normals.
pub type F32Array = LeArray<f32>;

/// Face indices.
pub type U32Array = LeArray<u32>;

impl<T: LeScalar> LeArray<T> {
    /// Wrap a byte slice whose length is a multiple of 4.
    pub(crate) fn new(bytes: Bytes) -> Self {
        debug_assert_eq!(bytes.len() % 4, 0);
        Self {
            bytes,
            _marker: PhantomData,
        }
    }

    /// Number of scalars (not triples).
    pub fn len(&self) -> usize {
        self.bytes.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Scalar at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<T> {
        let start = index.checked_mul(4)?;
        let chunk = self.bytes.get(start..start.checked_add(4)?)?;
        Some(T::from_le([chunk[0], chunk[1], chunk[2], chunk[3]]))
    }

    /// Iterate scalars in wire order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.bytes
            .chunks_exact(4)
            .map(|c| T::from_le([c[0], c[1], c[2], c[3]]))
    }

    /// Iterate `[x, y, z]` (or `[a, b, c]`) triples.
    pub fn triples(&self) -> impl Iterator<Item = [T; 3]> + '_ {
        self.bytes.chunks_exact(12).map(|c| {
            [
                T::from_le([c[0], c[1], c[2], c[3]]),
                T::from_le([c[4], c[5], c[6], c[7]]),
                T::from_le([c[8], c[9], c[10], c[11]]),
            ]
        })
    }

    /// Copy into an owned vector (for renderers that need aligned storage).
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// The raw little-endian bytes backing this view.
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl<T: LeScalar + fmt::Debug> fmt::Debug for LeArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeArray")
            .field("len", &self.len())
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_scalars() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1.5f32.to_le_bytes());
        raw.extend_from_slice(&(-2.0f32).to_le_bytes());
        let arr = F32Array::new(Bytes::from(raw));

        assert_eq!(arr.len(), 2);
        assert_eq!(arr.get(0), Some(1.5));
        assert_eq!(arr.get(1), Some(-2.0));
        assert_eq!(arr.get(2), None);
    }

    #[test]
    fn triples_group_by_three() {
        let raw: Vec<u8> = [0u32, 1, 2, 2, 3, 0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let arr = U32Array::new(Bytes::from(raw));

        let faces: Vec<[u32; 3]> = arr.triples().collect();
        assert_eq!(faces, vec![[0, 1, 2], [2, 3, 0]]);
    }
}
