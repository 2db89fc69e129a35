//! The decoded mesh and the assembler that builds it from PLY records.

use serde::{Deserialize, Serialize};

use crate::de::RecordSink;
use crate::record::Record;
use crate::{ElementDef, MeshError, PropertyType};

/// Axis-aligned bounds of the vertex positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = BoundingBox {
            min: *first,
            max: *first,
        };
        for point in rest {
            for axis in 0..3usize {
                bounds.min[axis] = bounds.min[axis].min(point[axis]);
                bounds.max[axis] = bounds.max[axis].max(point[axis]);
            }
        }
        Some(bounds)
    }

    pub fn center(&self) -> [f32; 3] {
        [0usize, 1, 2].map(|axis| (self.min[axis] + self.max[axis]) * 0.5)
    }
}

/// Sphere centered on the bounding box center that encloses every vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingSphere {
    pub center: [f32; 3],
    pub radius: f32,
}

impl BoundingSphere {
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let center = BoundingBox::from_points(points)?.center();
        let radius_sq = points
            .iter()
            .map(|p| {
                (0..3usize)
                    .map(|axis| (p[axis] - center[axis]).powi(2))
                    .sum::<f32>()
            })
            .fold(0.0f32, f32::max);
        Some(BoundingSphere {
            center,
            radius: radius_sq.sqrt(),
        })
    }
}

/// A triangulated mesh.
///
/// `colors` and `normals` run parallel to `positions`. Every face indexes
/// into `positions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub colors: Option<Vec<[f32; 3]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub faces: Vec<[u32; 3]>,
    /// One normal per face, as declared by ASCII STL facets.
    pub face_normals: Option<Vec<[f32; 3]>>,
    /// The three corner colors of each face.
    pub face_colors: Option<Vec<[[f32; 3]; 3]>>,
    pub has_colors: bool,
    pub alpha: Option<f32>,
    pub bounding_box: Option<BoundingBox>,
    pub bounding_sphere: Option<BoundingSphere>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Validate face indices, spread vertex colors onto face corners and
    /// compute bounds.
    pub(crate) fn finalize(mut self) -> Result<Self, MeshError> {
        let vertex_count = self.positions.len();
        if let Some(&index) = self
            .faces
            .iter()
            .flatten()
            .find(|&&index| index as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        if self.has_colors {
            if let Some(colors) = &self.colors {
                let face_colors = self
                    .faces
                    .iter()
                    .map(|&face| face.map(|index| colors[index as usize]))
                    .collect();
                self.face_colors = Some(face_colors);
            }
        }

        self.bounding_box = BoundingBox::from_points(&self.positions);
        self.bounding_sphere = BoundingSphere::from_points(&self.positions);
        Ok(self)
    }
}

#[derive(Deserialize)]
struct VertexRow {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Deserialize)]
struct FaceRow {
    #[serde(alias = "vertex_index")]
    vertex_indices: Vec<u32>,
}

/// Builds a [`Mesh`] from PLY `vertex` and `face` records.
///
/// Other elements are ignored.
#[derive(Debug)]
pub struct MeshBuilder {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    all_colored: bool,
    faces: Vec<[u32; 3]>,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            colors: Vec::new(),
            all_colored: true,
            faces: Vec::new(),
        }
    }

    /// Add a vertex. The mesh only gets colors if every vertex has one.
    pub fn add_vertex(&mut self, position: [f32; 3], color: Option<[f32; 3]>) {
        self.positions.push(position);
        match color {
            Some(color) if self.all_colored => self.colors.push(color),
            Some(_) => {}
            None => {
                self.all_colored = false;
                self.colors = Vec::new();
            }
        }
    }

    /// Add a triangle or a quad. Quads are fan split into `(0, 1, 3)` and
    /// `(1, 2, 3)`, which assumes a convex planar quad.
    pub fn add_polygon(&mut self, indices: &[u32]) -> Result<(), MeshError> {
        match *indices {
            [a, b, c] => self.faces.push([a, b, c]),
            [a, b, c, d] => {
                self.faces.push([a, b, d]);
                self.faces.push([b, c, d]);
            }
            _ => return Err(MeshError::UnsupportedFaceArity(indices.len())),
        }
        Ok(())
    }

    pub fn finish(self) -> Result<Mesh, MeshError> {
        let has_colors = self.all_colored && !self.positions.is_empty();
        Mesh {
            positions: self.positions,
            colors: has_colors.then_some(self.colors),
            has_colors,
            faces: self.faces,
            ..Default::default()
        }
        .finalize()
    }
}

/// Color channel normalized by its declared type and clamped to `[0, 1]`,
/// if the record has it. Negative values of signed types clamp to 0.
fn color_channel(element: &ElementDef, record: &Record, name: &str) -> Option<f32> {
    let PropertyType::Scalar { data_type } = element.get_property(name)?.property_type else {
        return None;
    };
    Some((record.scalar(name)? / data_type.color_scale()).clamp(0.0, 1.0) as f32)
}

fn vertex_color(element: &ElementDef, record: &Record) -> Option<[f32; 3]> {
    Some([
        color_channel(element, record, "red")?,
        color_channel(element, record, "green")?,
        color_channel(element, record, "blue")?,
    ])
}

impl RecordSink for MeshBuilder {
    fn accept(&mut self, element: &ElementDef, record: Record) -> Result<(), MeshError> {
        match element.name.as_str() {
            "vertex" => {
                let VertexRow { x, y, z } = record.deserialize()?;
                self.add_vertex([x, y, z], vertex_color(element, &record));
            }
            "face" => {
                let FaceRow { vertex_indices } = record.deserialize()?;
                self.add_polygon(&vertex_indices)?;
            }
            _ => {}
        }
        Ok(())
    }
}
