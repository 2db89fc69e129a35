use std::str::SplitAsciiWhitespace;

use crate::byte_view::ByteView;
use crate::{MeshError, ScalarType};

/// Source of typed values for one element row.
pub trait ScalarReader {
    fn read_scalar(&mut self, ty: ScalarType) -> Result<f64, MeshError>;

    /// Read a list length. Counts must be non-negative whole numbers.
    fn read_count(&mut self, ty: ScalarType) -> Result<usize, MeshError> {
        let count = self.read_scalar(ty)?;
        if count < 0.0 || count.fract() != 0.0 {
            return Err(MeshError::TypeMismatch {
                expected: "non-negative list count".to_string(),
                found: count.to_string(),
            });
        }
        Ok(count as usize)
    }
}

/// Forward cursor over a binary payload.
pub struct BinValReader<'a, B: ByteView> {
    buffer: &'a [u8],
    position: usize,
    little_endian: bool,
    view: &'a B,
}

impl<'a, B: ByteView> BinValReader<'a, B> {
    pub(crate) fn new(buffer: &'a [u8], position: usize, little_endian: bool, view: &'a B) -> Self {
        Self {
            buffer,
            position,
            little_endian,
            view,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl<B: ByteView> ScalarReader for BinValReader<'_, B> {
    fn read_scalar(&mut self, ty: ScalarType) -> Result<f64, MeshError> {
        let (value, consumed) =
            self.view
                .read_scalar(self.buffer, self.position, ty, self.little_endian)?;
        self.position += consumed;
        Ok(value)
    }
}

/// Whitespace separated tokens of a single ASCII body line.
pub struct AsciiValReader<'a> {
    tokens: SplitAsciiWhitespace<'a>,
    line_number: usize,
}

impl<'a> AsciiValReader<'a> {
    pub(crate) fn new(line: &'a str, line_number: usize) -> Self {
        Self {
            tokens: line.split_ascii_whitespace(),
            line_number,
        }
    }
}

impl ScalarReader for AsciiValReader<'_> {
    fn read_scalar(&mut self, ty: ScalarType) -> Result<f64, MeshError> {
        let token = self.tokens.next().ok_or_else(|| {
            MeshError::TruncatedInput(format!(
                "body line {} has fewer values than its element declares",
                self.line_number
            ))
        })?;
        ty.parse_token(token)
    }
}
