//! STL (Stereolithography) decoding.
//!
//! # Format Detection
//!
//! STL has no reliable magic: binary files may start with `solid` just like
//! ASCII ones. The encoding is decided once per input:
//! - if the triangle count at offset 80 predicts the exact buffer length
//!   (`84 + 50 * count`), the file is binary;
//! - otherwise any byte above 127 marks it binary (files with a wrong
//!   triangle count), and a buffer of pure ASCII is parsed as text.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    – Header, may carry "COLOR=" followed by R G B A bytes
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Packed color, only meaningful with a COLOR= header
//! end
//! ```
//!
//! # ASCII Format
//!
//! ```text
//! solid name
//!   facet normal ni nj nk
//!     outer loop
//!       vertex v1x v1y v1z
//!       vertex v2x v2y v2z
//!       vertex v3x v3y v3z
//!     endloop
//!   endfacet
//!   ...
//! endsolid name
//! ```

mod ascii;
mod binary;

use tracing::debug;

use crate::byte_view::{ByteView, NativeView};
use crate::{Mesh, MeshError, MeshSource};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Header plus the triangle count.
const DATA_OFFSET: usize = HEADER_SIZE + 4;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Classify a buffer as binary (`true`) or ASCII STL.
pub fn is_binary(data: &[u8]) -> bool {
    if let Ok(count) = NativeView.read_u32(data, HEADER_SIZE, true) {
        let expected = DATA_OFFSET as u64 + TRIANGLE_SIZE as u64 * u64::from(count);
        if expected == data.len() as u64 {
            return true;
        }
    }
    data.iter().any(|&byte| byte > 127)
}

/// Decode an ASCII or binary STL file into a mesh.
///
/// STL meshes are not indexed: every triangle gets three fresh vertices.
pub fn decode_stl<'a>(source: impl Into<MeshSource<'a>>) -> Result<Mesh, MeshError> {
    decode_stl_with(source, &NativeView)
}

/// Like [`decode_stl`], reading binary payloads through `view`.
pub fn decode_stl_with<'a, B: ByteView>(
    source: impl Into<MeshSource<'a>>,
    view: &B,
) -> Result<Mesh, MeshError> {
    let data = source.into().to_latin1_bytes();

    let mesh = if is_binary(&data) {
        debug!(len = data.len(), "decoding binary STL");
        binary::decode_binary(&data, view)?
    } else {
        debug!(len = data.len(), "decoding ASCII STL");
        // Detection guarantees every byte is ASCII here, so each byte is
        // exactly one character.
        let text = std::str::from_utf8(&data)?;
        ascii::decode_ascii(text)?
    };

    mesh.finalize()
}
