use crate::byte_view::ByteView;
use crate::stl::{DATA_OFFSET, HEADER_SIZE, TRIANGLE_SIZE};
use crate::{Mesh, MeshError};

/// Vendor extension marking a default color in the 80-byte header.
const COLOR_SIGNATURE: &[u8] = b"COLOR=";

/// Set on a packed facet color when the facet uses the default color.
const DEFAULT_COLOR_BIT: u16 = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DefaultColor {
    pub rgb: [f32; 3],
    pub alpha: f32,
}

/// Find `COLOR=` followed by R, G, B, A bytes. The last match wins.
pub(crate) fn find_default_color(header: &[u8]) -> Option<DefaultColor> {
    header
        .windows(COLOR_SIGNATURE.len() + 4)
        .filter(|window| window.starts_with(COLOR_SIGNATURE))
        .last()
        .map(|window| {
            let channel = |i: usize| f32::from(window[COLOR_SIGNATURE.len() + i]) / 255.0;
            DefaultColor {
                rgb: [channel(0), channel(1), channel(2)],
                alpha: channel(3),
            }
        })
}

/// Unpack a 5/5/5 facet color, or fall back to the default when bit 15 is set.
pub(crate) fn unpack_color(packed: u16, default: [f32; 3]) -> [f32; 3] {
    if packed & DEFAULT_COLOR_BIT != 0 {
        return default;
    }
    [0, 5, 10].map(|shift| f32::from((packed >> shift) & 0x1f) / 31.0)
}

fn read_vec3<B: ByteView>(view: &B, data: &[u8], offset: usize) -> Result<[f32; 3], MeshError> {
    Ok([
        view.read_f32(data, offset, true)?,
        view.read_f32(data, offset + 4, true)?,
        view.read_f32(data, offset + 8, true)?,
    ])
}

pub(crate) fn decode_binary<B: ByteView>(data: &[u8], view: &B) -> Result<Mesh, MeshError> {
    let triangle_count = view.read_u32(data, HEADER_SIZE, true)? as usize;
    let default_color = find_default_color(&data[..HEADER_SIZE]);

    // The count may be wrong for files detected by byte scan; never reserve
    // more than the payload can hold.
    let capacity = triangle_count.min(data.len().saturating_sub(DATA_OFFSET) / TRIANGLE_SIZE);
    let mut positions = Vec::with_capacity(capacity * 3);
    let mut normals = Vec::with_capacity(capacity * 3);
    let mut colors = Vec::with_capacity(if default_color.is_some() { capacity * 3 } else { 0 });
    let mut faces = Vec::with_capacity(capacity);

    for triangle in 0..triangle_count {
        let start = DATA_OFFSET + triangle * TRIANGLE_SIZE;
        let normal = read_vec3(view, data, start)?;

        let color = match default_color {
            Some(default) => Some(unpack_color(
                view.read_u16(data, start + 48, true)?,
                default.rgb,
            )),
            None => None,
        };

        #[allow(clippy::cast_possible_truncation)]
        let base = positions.len() as u32;
        for corner in 0..3 {
            positions.push(read_vec3(view, data, start + 12 + corner * 12)?);
            normals.push(normal);
            if let Some(color) = color {
                colors.push(color);
            }
        }
        faces.push([base, base + 1, base + 2]);
    }

    Ok(Mesh {
        positions,
        normals: Some(normals),
        colors: default_color.map(|_| colors),
        has_colors: default_color.is_some(),
        alpha: default_color.map(|c| c.alpha),
        faces,
        ..Default::default()
    })
}
