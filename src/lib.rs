//! Decoders for PLY (Polygon File Format) and STL (Stereolithography) meshes.
//!
//! Both decoders take a fully buffered input, either raw bytes or text, and
//! produce a triangulated [`Mesh`]. PLY files describe their own layout in a
//! header, so we parse the header first and use it to drive decoding of the
//! body, which can be ASCII or binary in either byte order. STL has no header
//! schema; its encoding is detected heuristically.
//!
//! # Example
//!
//! ```rust
//! use mesh_decode::{decode_ply, DecodeOptions};
//!
//! let ply_data = r#"ply
//! format ascii 1.0
//! element vertex 3
//! property float x
//! property float y
//! property float z
//! element face 1
//! property list uchar int vertex_indices
//! end_header
//! 0 0 0
//! 1 0 0
//! 0 1 0
//! 3 0 1 2
//! "#;
//!
//! let mesh = decode_ply(ply_data, &DecodeOptions::default()).unwrap();
//! assert_eq!(mesh.positions.len(), 3);
//! assert_eq!(mesh.faces, vec![[0, 1, 2]]);
//! ```

pub mod byte_view;
pub mod de;
mod error;
pub mod mesh;
mod options;
pub mod record;
pub mod stl;

pub use byte_view::{read_scalar, BitFieldView, ByteView, NativeView};
pub use de::{decode_ply_records, decode_ply_records_with, RecordSink};
pub use error::MeshError;
pub use mesh::{BoundingBox, BoundingSphere, Mesh, MeshBuilder};
pub use options::DecodeOptions;
pub use record::{Record, Value};
pub use stl::decode_stl;

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Raw input handed to a decoder.
///
/// PLY reads text as its UTF-8 bytes. STL maps text onto bytes one byte per
/// character, keeping the low 8 bits of each code point: this matches how
/// binary meshes end up in strings when loaded as Latin-1 text, and is only
/// lossless for code points up to 255.
#[derive(Debug, Clone, Copy)]
pub enum MeshSource<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
}

impl<'a> MeshSource<'a> {
    /// The source as UTF-8 bytes.
    pub fn as_bytes(self) -> &'a [u8] {
        match self {
            MeshSource::Bytes(bytes) => bytes,
            MeshSource::Text(text) => text.as_bytes(),
        }
    }

    /// The source with text mapped one byte per character.
    pub fn to_latin1_bytes(self) -> Cow<'a, [u8]> {
        match self {
            MeshSource::Bytes(bytes) => Cow::Borrowed(bytes),
            MeshSource::Text(text) if text.is_ascii() => Cow::Borrowed(text.as_bytes()),
            MeshSource::Text(text) => Cow::Owned(text.chars().map(|c| c as u32 as u8).collect()),
        }
    }
}

impl<'a> From<&'a [u8]> for MeshSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        MeshSource::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for MeshSource<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        MeshSource::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for MeshSource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        MeshSource::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for MeshSource<'a> {
    fn from(text: &'a str) -> Self {
        MeshSource::Text(text)
    }
}

impl<'a> From<&'a String> for MeshSource<'a> {
    fn from(text: &'a String) -> Self {
        MeshSource::Text(text)
    }
}

/// Decode a PLY file into a triangulated mesh.
///
/// The body encoding (ASCII, binary little endian or binary big endian) is
/// taken from the header's `format` line.
pub fn decode_ply<'a>(
    source: impl Into<MeshSource<'a>>,
    options: &DecodeOptions,
) -> Result<Mesh, MeshError> {
    let data = source.into().as_bytes();
    let mut builder = MeshBuilder::new();
    decode_ply_records(data, options, &mut builder)?;
    builder.finish()
}

/// PLY file format (ascii or binary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl fmt::Display for PlyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlyFormat::Ascii => write!(f, "ascii"),
            PlyFormat::BinaryLittleEndian => write!(f, "binary_little_endian"),
            PlyFormat::BinaryBigEndian => write!(f, "binary_big_endian"),
        }
    }
}

impl FromStr for PlyFormat {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascii" => Ok(PlyFormat::Ascii),
            "binary_little_endian" => Ok(PlyFormat::BinaryLittleEndian),
            "binary_big_endian" => Ok(PlyFormat::BinaryBigEndian),
            _ => Err(MeshError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// PLY scalar data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    pub fn parse(s: &str) -> Result<Self, MeshError> {
        match s {
            "char" | "int8" => Ok(ScalarType::I8),
            "uchar" | "uint8" => Ok(ScalarType::U8),
            "short" | "int16" => Ok(ScalarType::I16),
            "ushort" | "uint16" => Ok(ScalarType::U16),
            "int" | "int32" => Ok(ScalarType::I32),
            "uint" | "uint32" => Ok(ScalarType::U32),
            "float" | "float32" => Ok(ScalarType::F32),
            "double" | "float64" => Ok(ScalarType::F64),
            _ => Err(MeshError::UnknownPropertyType(s.to_string())),
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    /// Parse a single ASCII token as a value of this type.
    ///
    /// Integer types only accept integer literals in range.
    pub fn parse_token(&self, token: &str) -> Result<f64, MeshError> {
        Ok(match self {
            ScalarType::I8 => f64::from(token.parse::<i8>()?),
            ScalarType::U8 => f64::from(token.parse::<u8>()?),
            ScalarType::I16 => f64::from(token.parse::<i16>()?),
            ScalarType::U16 => f64::from(token.parse::<u16>()?),
            ScalarType::I32 => f64::from(token.parse::<i32>()?),
            ScalarType::U32 => f64::from(token.parse::<u32>()?),
            ScalarType::F32 => f64::from(token.parse::<f32>()?),
            ScalarType::F64 => token.parse::<f64>()?,
        })
    }

    /// Divisor that maps a color channel of this type onto `[0, 1]`.
    pub fn color_scale(&self) -> f64 {
        match self {
            ScalarType::I8 | ScalarType::U8 => f64::from(u8::MAX),
            ScalarType::I16 | ScalarType::U16 => f64::from(u16::MAX),
            ScalarType::I32 | ScalarType::U32 => f64::from(u32::MAX),
            ScalarType::F32 | ScalarType::F64 => 1.0,
        }
    }
}

impl FromStr for ScalarType {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Shape of a property: a single value or a counted list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PropertyType {
    Scalar {
        data_type: ScalarType,
    },
    List {
        count_type: ScalarType,
        data_type: ScalarType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDef {
    pub name: String,
    pub property_type: PropertyType,
}

/// PLY element definition (e.g., vertex, face)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementDef {
    pub name: String,
    pub count: usize,
    pub properties: Vec<PropertyDef>,
}

impl ElementDef {
    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().rev().find(|p| p.name == name)
    }
}

/// PLY header containing format information and element definitions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlyHeader {
    pub format: PlyFormat,
    pub version: String,
    pub elements: Vec<ElementDef>,
    pub comments: Vec<String>,
    pub obj_info: Vec<String>,
    /// Header lines whose directive was not recognized.
    pub ignored_directives: Vec<String>,
}

const MAGIC: &str = "ply";
const HEADER_TERMINATOR: &[u8] = b"end_header";

fn is_blank(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Byte offset just past the `end_header` line and its single line break.
/// The line may be indented or carry trailing blanks.
pub(crate) fn find_header_end(data: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = data[from..]
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
    {
        let start = from + pos;
        let end = start + HEADER_TERMINATOR.len();
        let indent = data[..start].iter().rev().take_while(|&&b| is_blank(b)).count();
        let at_line_start = start > indent && data[start - indent - 1] == b'\n';
        let trailing = data[end..].iter().take_while(|&&b| is_blank(b)).count();
        match &data[end + trailing..] {
            [b'\n', ..] if at_line_start => return Some(end + trailing + 1),
            [b'\r', b'\n', ..] if at_line_start => return Some(end + trailing + 2),
            _ => from = end,
        }
    }
    None
}

impl PlyHeader {
    /// Parse a PLY header from the start of `data`.
    ///
    /// Returns the header and its length in bytes, including the line break
    /// that terminates `end_header`. The body starts at that offset.
    pub fn parse(data: &[u8], options: &DecodeOptions) -> Result<(Self, usize), MeshError> {
        if !data.starts_with(MAGIC.as_bytes()) {
            return Err(MeshError::MalformedHeader(
                "File must start with 'ply'".to_string(),
            ));
        }
        let header_len = find_header_end(data)
            .ok_or_else(|| MeshError::MalformedHeader("No end_header found".to_string()))?;
        let text = std::str::from_utf8(&data[..header_len])?;

        let mut lines = text.lines();
        if lines.next().map(str::trim) != Some(MAGIC) {
            return Err(MeshError::MalformedHeader(
                "File must start with 'ply'".to_string(),
            ));
        }

        let mut format = None;
        let mut version = String::new();
        let mut elements = Vec::new();
        let mut comments = Vec::new();
        let mut obj_info = Vec::new();
        let mut ignored_directives = Vec::new();
        let mut current_element: Option<ElementDef> = None;

        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line == "end_header" {
                break;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();

            match parts[0] {
                "format" => {
                    if parts.len() < 3 {
                        return Err(MeshError::MalformedHeader(format!(
                            "Invalid format line: {line}"
                        )));
                    }
                    format = Some(parts[1].parse::<PlyFormat>()?);
                    version = parts[2].to_string();
                }
                "comment" => {
                    comments.push(parts[1..].join(" "));
                }
                "obj_info" => {
                    obj_info.push(parts[1..].join(" "));
                }
                "element" => {
                    if parts.len() < 3 {
                        return Err(MeshError::MalformedHeader(format!(
                            "Invalid element line: {line}"
                        )));
                    }

                    if let Some(element) = current_element.take() {
                        elements.push(element);
                    }

                    let count = parts[2].parse::<usize>().map_err(|_| {
                        MeshError::MalformedHeader(format!("Invalid element count: {}", parts[2]))
                    })?;

                    current_element = Some(ElementDef {
                        name: parts[1].to_string(),
                        count,
                        properties: Vec::new(),
                    });
                }
                "property" => {
                    let element = current_element.as_mut().ok_or_else(|| {
                        MeshError::MalformedHeader(format!("Property without element: {line}"))
                    })?;
                    element.properties.push(parse_property(&parts, line, options)?);
                }
                directive => {
                    warn!(directive, line, "ignoring unknown PLY header directive");
                    ignored_directives.push(line.to_string());
                }
            }
        }

        if let Some(element) = current_element {
            elements.push(element);
        }

        let format = format
            .ok_or_else(|| MeshError::MalformedHeader("Missing format specification".to_string()))?;

        Ok((
            PlyHeader {
                format,
                version,
                elements,
                comments,
                obj_info,
                ignored_directives,
            },
            header_len,
        ))
    }

    /// Get element definition by name
    pub fn get_element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Check if this header defines an element with the given name
    pub fn has_element(&self, name: &str) -> bool {
        self.elements.iter().any(|e| e.name == name)
    }
}

fn parse_property(
    parts: &[&str],
    line: &str,
    options: &DecodeOptions,
) -> Result<PropertyDef, MeshError> {
    if parts.len() < 3 {
        return Err(MeshError::MalformedHeader(format!(
            "Invalid property line: {line}"
        )));
    }

    // Type dispatch comes first; the name mapping never changes list-ness.
    let (property_type, name) = if parts[1] == "list" {
        // property list <count_type> <data_type> <name>
        if parts.len() < 5 {
            return Err(MeshError::MalformedHeader(format!(
                "Invalid list property line: {line}"
            )));
        }
        let property_type = PropertyType::List {
            count_type: ScalarType::parse(parts[2])?,
            data_type: ScalarType::parse(parts[3])?,
        };
        (property_type, parts[4])
    } else {
        let property_type = PropertyType::Scalar {
            data_type: ScalarType::parse(parts[1])?,
        };
        (property_type, parts[2])
    };

    Ok(PropertyDef {
        name: options.map_property_name(name),
        property_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_header() {
        let header_text = r#"ply
format ascii 1.0
comment A simple PLY file
element vertex 3
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
"#;

        let (header, len) =
            PlyHeader::parse(header_text.as_bytes(), &DecodeOptions::default()).unwrap();

        assert_eq!(len, header_text.len());
        assert_eq!(header.format, PlyFormat::Ascii);
        assert_eq!(header.version, "1.0");
        assert_eq!(header.elements.len(), 2);
        assert_eq!(header.comments, vec!["A simple PLY file".to_string()]);

        let vertex_element = header.get_element("vertex").unwrap();
        assert_eq!(vertex_element.count, 3);
        assert_eq!(vertex_element.properties.len(), 3);

        let face_element = header.get_element("face").unwrap();
        assert_eq!(face_element.count, 1);
        assert_eq!(
            face_element.properties[0].property_type,
            PropertyType::List {
                count_type: ScalarType::U8,
                data_type: ScalarType::I32,
            }
        );
    }

    #[test]
    fn test_scalar_type_parsing() {
        assert_eq!(ScalarType::parse("float").unwrap(), ScalarType::F32);
        assert_eq!(ScalarType::parse("float32").unwrap(), ScalarType::F32);
        assert_eq!(ScalarType::parse("double").unwrap(), ScalarType::F64);
        assert_eq!(ScalarType::parse("int").unwrap(), ScalarType::I32);
        assert_eq!(ScalarType::parse("uchar").unwrap(), ScalarType::U8);
        assert_eq!(ScalarType::parse("uint16").unwrap(), ScalarType::U16);

        assert!(matches!(
            ScalarType::parse("invalid_type"),
            Err(MeshError::UnknownPropertyType(_))
        ));
    }

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(ScalarType::I8.size_bytes(), 1);
        assert_eq!(ScalarType::U16.size_bytes(), 2);
        assert_eq!(ScalarType::F32.size_bytes(), 4);
        assert_eq!(ScalarType::F64.size_bytes(), 8);
    }

    #[test]
    fn test_parse_token_is_strict_for_integers() {
        assert_eq!(ScalarType::U8.parse_token("255").unwrap(), 255.0);
        assert!(ScalarType::U8.parse_token("256").is_err());
        assert!(ScalarType::I32.parse_token("1.5").is_err());
        assert_eq!(ScalarType::F32.parse_token("-1.5e2").unwrap(), -150.0);
    }

    #[test]
    fn test_find_header_end() {
        assert_eq!(find_header_end(b"ply\nend_header\nxyz"), Some(15));
        assert_eq!(find_header_end(b"ply\r\nend_header\r\nxyz"), Some(17));
        assert_eq!(find_header_end(b"ply\nend_header"), None);
        // Only a whole line counts as the terminator.
        assert_eq!(find_header_end(b"ply\ncomment end_header\n"), None);
        assert_eq!(find_header_end(b"ply\n  end_header\nxyz"), Some(17));
        assert_eq!(find_header_end(b"ply\n\tend_header \r\nxyz"), Some(18));
    }

    #[test]
    fn test_text_source_bytes() {
        let source = MeshSource::from("a\u{00ff}\u{0141}");
        assert_eq!(source.to_latin1_bytes().as_ref(), &[b'a', 0xff, 0x41]);
        assert_eq!(source.as_bytes(), "a\u{00ff}\u{0141}".as_bytes());
    }
}
