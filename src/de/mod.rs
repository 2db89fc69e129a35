//! PLY body decoding.
//!
//! The header drives everything: elements are decoded in declaration order,
//! `count` records each, and every record is handed to a [`RecordSink`] as
//! soon as it is complete.

mod ascii;
mod binary;
mod row;

pub mod val_reader;

use tracing::debug;

use crate::byte_view::{ByteView, NativeView};
use crate::record::Record;
use crate::{DecodeOptions, ElementDef, MeshError, PlyFormat, PlyHeader};

/// Receives decoded records one at a time, tagged with their element.
pub trait RecordSink {
    fn accept(&mut self, element: &ElementDef, record: Record) -> Result<(), MeshError>;
}

impl<F> RecordSink for F
where
    F: FnMut(&ElementDef, Record) -> Result<(), MeshError>,
{
    fn accept(&mut self, element: &ElementDef, record: Record) -> Result<(), MeshError> {
        self(element, record)
    }
}

/// Decode every record of a PLY file into `sink`, returning the parsed header.
pub fn decode_ply_records<S: RecordSink + ?Sized>(
    data: &[u8],
    options: &DecodeOptions,
    sink: &mut S,
) -> Result<PlyHeader, MeshError> {
    decode_ply_records_with(data, options, &NativeView, sink)
}

/// Like [`decode_ply_records`], reading binary payloads through `view`.
pub fn decode_ply_records_with<B: ByteView, S: RecordSink + ?Sized>(
    data: &[u8],
    options: &DecodeOptions,
    view: &B,
    sink: &mut S,
) -> Result<PlyHeader, MeshError> {
    let (header, header_len) = PlyHeader::parse(data, options)?;
    debug!(
        format = %header.format,
        elements = header.elements.len(),
        header_len,
        "decoding PLY body"
    );

    match header.format {
        PlyFormat::Ascii => {
            let body = std::str::from_utf8(&data[header_len..])?;
            ascii::decode_ascii_body(body, &header, sink)?;
        }
        PlyFormat::BinaryLittleEndian => {
            binary::decode_binary_body(data, header_len, true, &header, view, sink)?;
        }
        PlyFormat::BinaryBigEndian => {
            binary::decode_binary_body(data, header_len, false, &header, view, sink)?;
        }
    }

    Ok(header)
}
