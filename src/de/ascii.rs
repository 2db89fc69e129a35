use tracing::warn;

use crate::de::row::read_row;
use crate::de::val_reader::AsciiValReader;
use crate::de::RecordSink;
use crate::{MeshError, PlyHeader};

/// Decode an ASCII body: one non-blank line per record, elements grouped in
/// header order.
pub(crate) fn decode_ascii_body<S: RecordSink + ?Sized>(
    body: &str,
    header: &PlyHeader,
    sink: &mut S,
) -> Result<(), MeshError> {
    let mut lines = body
        .split('\n')
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    for elem_def in &header.elements {
        for index in 0..elem_def.count {
            let Some((line_number, line)) = lines.next() else {
                return Err(MeshError::TruncatedInput(format!(
                    "element '{}' declares {} records but the body ends after {}",
                    elem_def.name, elem_def.count, index
                )));
            };
            let mut reader = AsciiValReader::new(line, line_number);
            let record = read_row(&mut reader, elem_def)?;
            sink.accept(elem_def, record)?;
        }
    }

    let trailing = lines.count();
    if trailing > 0 {
        warn!(trailing, "ignoring lines after the last declared PLY record");
    }

    Ok(())
}
