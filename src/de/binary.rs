use tracing::debug;

use crate::byte_view::ByteView;
use crate::de::row::read_row;
use crate::de::val_reader::BinValReader;
use crate::de::RecordSink;
use crate::{MeshError, PlyHeader};

/// Decode a binary body starting at `start`.
pub(crate) fn decode_binary_body<B: ByteView, S: RecordSink + ?Sized>(
    data: &[u8],
    start: usize,
    little_endian: bool,
    header: &PlyHeader,
    view: &B,
    sink: &mut S,
) -> Result<(), MeshError> {
    let mut reader = BinValReader::new(data, start, little_endian, view);

    for elem_def in &header.elements {
        for _ in 0..elem_def.count {
            let record = read_row(&mut reader, elem_def)?;
            sink.accept(elem_def, record)?;
        }
    }

    let end = reader.position();
    if end < data.len() {
        debug!(
            trailing_bytes = data.len() - end,
            "binary PLY payload longer than its header declares"
        );
    }
    Ok(())
}
