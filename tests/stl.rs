//! STL detection and decoding

use mesh_decode::stl::{decode_stl_with, is_binary};
use mesh_decode::{decode_stl, BitFieldView, MeshError};

const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];

fn binary_stl(header: &[u8], facets: &[([f32; 3], [[f32; 3]; 3], u16)]) -> Vec<u8> {
    let mut data = header.to_vec();
    data.resize(80, b' ');
    data.extend_from_slice(&(facets.len() as u32).to_le_bytes());
    for (normal, vertices, attribute) in facets {
        for v in std::iter::once(normal).chain(vertices.iter()).flatten() {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&attribute.to_le_bytes());
    }
    data
}

fn color_header(rgba: [u8; 4]) -> Vec<u8> {
    let mut header = b"solid COLOR=".to_vec();
    header.extend_from_slice(&rgba);
    header
}

const ASCII_STL: &str = "solid pyramid
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0.577 0.577 0.577
    outer loop
      vertex 1 0 0
      vertex 0 1 0
      vertex 0 0 1.5e0
    endloop
  endfacet
endsolid pyramid
";

#[test]
fn test_detection() {
    let data = binary_stl(b"solid looks like text", &[([0.0, 0.0, 1.0], TRIANGLE, 0)]);
    assert!(is_binary(&data));
    assert!(!is_binary(ASCII_STL.as_bytes()));

    // One byte short: the size check fails and the byte scan decides.
    let truncated = &data[..data.len() - 1];
    assert!(is_binary(truncated), "-1.0 contains bytes above 127");
}

#[test]
fn test_binary_decode() {
    let data = binary_stl(b"", &[([0.0, 0.0, 1.0], TRIANGLE, 0)]);
    let mesh = decode_stl(&data).unwrap();

    assert_eq!(mesh.positions, TRIANGLE.to_vec());
    assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    assert_eq!(mesh.normals, Some(vec![[0.0, 0.0, 1.0]; 3]));
    assert!(!mesh.has_colors);
    assert_eq!(mesh.alpha, None);
    assert_eq!(mesh.face_normals, None);

    let bbox = mesh.bounding_box.unwrap();
    assert_eq!(bbox.min, [-1.0, 0.0, 0.0]);
    assert_eq!(bbox.max, [0.0, 2.0, 0.0]);
}

#[test]
fn test_binary_vertices_are_not_shared() {
    let data = binary_stl(
        b"",
        &[([0.0; 3], TRIANGLE, 0), ([0.0; 3], TRIANGLE, 0)],
    );
    let mesh = decode_stl(&data).unwrap();
    assert_eq!(mesh.vertex_count(), 6);
    assert_eq!(mesh.faces, vec![[0, 1, 2], [3, 4, 5]]);
}

#[test]
fn test_default_color_extension() {
    let data = binary_stl(
        &color_header([255, 0, 0, 255]),
        &[
            ([0.0; 3], TRIANGLE, 0x8000),
            ([0.0; 3], TRIANGLE, 0x03e0),
        ],
    );
    let mesh = decode_stl(&data).unwrap();

    assert!(mesh.has_colors);
    assert_eq!(mesh.alpha, Some(1.0));
    let red = [1.0, 0.0, 0.0];
    let green = [0.0, 1.0, 0.0];
    assert_eq!(
        mesh.colors,
        Some(vec![red, red, red, green, green, green])
    );
    assert_eq!(
        mesh.face_colors,
        Some(vec![[red, red, red], [green, green, green]])
    );
}

#[test]
fn test_packed_color_ignored_without_extension() {
    let data = binary_stl(b"solid plain", &[([0.0; 3], TRIANGLE, 0x001f)]);
    let mesh = decode_stl(&data).unwrap();
    assert!(!mesh.has_colors);
    assert_eq!(mesh.colors, None);
}

#[test]
fn test_binary_with_wrong_count() {
    let mut data = binary_stl(b"", &[([0.0; 3], TRIANGLE, 0)]);
    // Claims two triangles but carries one.
    data[80..84].copy_from_slice(&2u32.to_le_bytes());
    assert!(matches!(
        decode_stl(&data),
        Err(MeshError::OutOfBounds { .. })
    ));
}

#[test]
fn test_binary_through_text_source() {
    let data = binary_stl(&color_header([0, 0, 255, 128]), &[([0.0; 3], TRIANGLE, 0x8000)]);
    let latin1: String = data.iter().map(|&b| char::from(b)).collect();

    let from_text = decode_stl(&latin1).unwrap();
    let from_bytes = decode_stl(&data).unwrap();
    assert_eq!(from_text, from_bytes);
    assert_eq!(from_text.alpha, Some(128.0 / 255.0));
}

#[test]
fn test_bit_field_view() {
    let data = binary_stl(b"", &[([0.0, 0.0, 1.0], TRIANGLE, 0)]);
    let mesh = decode_stl_with(&data, &BitFieldView).unwrap();
    assert_eq!(mesh, decode_stl(&data).unwrap());
}

#[test]
fn test_ascii_decode() {
    let mesh = decode_stl(ASCII_STL).unwrap();
    assert_eq!(mesh.vertex_count(), 6);
    assert_eq!(mesh.faces, vec![[0, 1, 2], [3, 4, 5]]);
    assert_eq!(mesh.positions[5], [0.0, 0.0, 1.5]);
    assert_eq!(
        mesh.face_normals,
        Some(vec![[0.0, 0.0, -1.0], [0.577, 0.577, 0.577]])
    );
    assert!(!mesh.has_colors);

    let bbox = mesh.bounding_box.unwrap();
    assert_eq!(bbox.max, [1.0, 1.0, 1.5]);
}

#[test]
fn test_ascii_facet_with_four_vertices() {
    let text = "solid bad\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\n\
                vertex 1 1 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid bad\n";
    assert!(matches!(decode_stl(text), Err(MeshError::MalformedStl(_))));
}

#[test]
fn test_ascii_unterminated_facet() {
    let text = "solid bad\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\n";
    assert!(matches!(decode_stl(text), Err(MeshError::TruncatedInput(_))));
}
