//! Typed reads from a byte buffer at arbitrary offsets.
//!
//! [`NativeView`] is the normal path and uses `byteorder`. [`BitFieldView`]
//! decodes the same values by assembling integers byte by byte and pulling
//! IEEE-754 sign, exponent and fraction fields apart by hand. It exists for
//! targets without fixed-width reads and as a cross-check for the native
//! path; both produce identical results.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{MeshError, ScalarType};

fn window(buffer: &[u8], offset: usize, width: usize) -> Result<&[u8], MeshError> {
    offset
        .checked_add(width)
        .and_then(|end| buffer.get(offset..end))
        .ok_or(MeshError::OutOfBounds {
            offset,
            width,
            len: buffer.len(),
        })
}

/// Fixed-width reads with explicit byte order.
///
/// Every read fails with [`MeshError::OutOfBounds`] when
/// `offset + width > buffer.len()`.
pub trait ByteView {
    fn read_u8(&self, buffer: &[u8], offset: usize) -> Result<u8, MeshError>;
    fn read_u16(&self, buffer: &[u8], offset: usize, little_endian: bool)
        -> Result<u16, MeshError>;
    fn read_u32(&self, buffer: &[u8], offset: usize, little_endian: bool)
        -> Result<u32, MeshError>;
    fn read_u64(&self, buffer: &[u8], offset: usize, little_endian: bool)
        -> Result<u64, MeshError>;
    fn read_f32(&self, buffer: &[u8], offset: usize, little_endian: bool)
        -> Result<f32, MeshError>;
    fn read_f64(&self, buffer: &[u8], offset: usize, little_endian: bool)
        -> Result<f64, MeshError>;

    fn read_i8(&self, buffer: &[u8], offset: usize) -> Result<i8, MeshError> {
        Ok(self.read_u8(buffer, offset)? as i8)
    }

    fn read_i16(&self, buffer: &[u8], offset: usize, little_endian: bool) -> Result<i16, MeshError> {
        Ok(self.read_u16(buffer, offset, little_endian)? as i16)
    }

    fn read_i32(&self, buffer: &[u8], offset: usize, little_endian: bool) -> Result<i32, MeshError> {
        Ok(self.read_u32(buffer, offset, little_endian)? as i32)
    }

    fn read_i64(&self, buffer: &[u8], offset: usize, little_endian: bool) -> Result<i64, MeshError> {
        Ok(self.read_u64(buffer, offset, little_endian)? as i64)
    }

    /// Read one value of a PLY scalar type, returning it with the number of
    /// bytes consumed.
    fn read_scalar(
        &self,
        buffer: &[u8],
        offset: usize,
        ty: ScalarType,
        little_endian: bool,
    ) -> Result<(f64, usize), MeshError> {
        let value = match ty {
            ScalarType::I8 => f64::from(self.read_i8(buffer, offset)?),
            ScalarType::U8 => f64::from(self.read_u8(buffer, offset)?),
            ScalarType::I16 => f64::from(self.read_i16(buffer, offset, little_endian)?),
            ScalarType::U16 => f64::from(self.read_u16(buffer, offset, little_endian)?),
            ScalarType::I32 => f64::from(self.read_i32(buffer, offset, little_endian)?),
            ScalarType::U32 => f64::from(self.read_u32(buffer, offset, little_endian)?),
            ScalarType::F32 => f64::from(self.read_f32(buffer, offset, little_endian)?),
            ScalarType::F64 => self.read_f64(buffer, offset, little_endian)?,
        };
        Ok((value, ty.size_bytes()))
    }
}

/// Read a scalar with the native view.
pub fn read_scalar(
    buffer: &[u8],
    offset: usize,
    ty: ScalarType,
    little_endian: bool,
) -> Result<(f64, usize), MeshError> {
    NativeView.read_scalar(buffer, offset, ty, little_endian)
}

/// Byte view backed by `byteorder`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeView;

macro_rules! native_read {
    ($name:ident, $ty:ty, $width:expr) => {
        fn $name(
            &self,
            buffer: &[u8],
            offset: usize,
            little_endian: bool,
        ) -> Result<$ty, MeshError> {
            let bytes = window(buffer, offset, $width)?;
            Ok(if little_endian {
                LittleEndian::$name(bytes)
            } else {
                BigEndian::$name(bytes)
            })
        }
    };
}

impl ByteView for NativeView {
    fn read_u8(&self, buffer: &[u8], offset: usize) -> Result<u8, MeshError> {
        Ok(window(buffer, offset, 1)?[0])
    }

    native_read!(read_u16, u16, 2);
    native_read!(read_u32, u32, 4);
    native_read!(read_u64, u64, 8);
    native_read!(read_f32, f32, 4);
    native_read!(read_f64, f64, 8);
}

/// Byte view that decodes from raw bit fields without fixed-width reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitFieldView;

impl BitFieldView {
    /// Assemble `width` bytes into an integer, most significant byte first.
    fn bits(
        buffer: &[u8],
        offset: usize,
        width: usize,
        little_endian: bool,
    ) -> Result<u64, MeshError> {
        let bytes = window(buffer, offset, width)?;
        let fold = |acc: u64, byte: &u8| (acc << 8) | u64::from(*byte);
        Ok(if little_endian {
            bytes.iter().rev().fold(0, fold)
        } else {
            bytes.iter().fold(0, fold)
        })
    }

    /// binary32: 1 sign bit, 8 exponent bits (bias 127), 23 fraction bits.
    fn decode_binary32(bits: u32) -> f32 {
        let sign = if bits >> 31 == 0 { 1.0 } else { -1.0 };
        let exponent = ((bits >> 23) & 0xff) as i32;
        let fraction = f64::from(bits & 0x7f_ffff);

        let magnitude = match exponent {
            0xff if fraction == 0.0 => f64::INFINITY,
            0xff => return f32::NAN,
            0 => fraction * 2f64.powi(-149),
            _ => (1.0 + fraction * 2f64.powi(-23)) * 2f64.powi(exponent - 127),
        };
        // Every binary32 value is exact in binary64, so the narrowing is lossless.
        (sign * magnitude) as f32
    }

    /// binary64: 1 sign bit, 11 exponent bits (bias 1023), 52 fraction bits.
    fn decode_binary64(bits: u64) -> f64 {
        let sign = if bits >> 63 == 0 { 1.0 } else { -1.0 };
        let exponent = ((bits >> 52) & 0x7ff) as i32;
        let fraction = (bits & 0xf_ffff_ffff_ffff) as f64;

        let magnitude = match exponent {
            0x7ff if fraction == 0.0 => f64::INFINITY,
            0x7ff => return f64::NAN,
            // 2^-1074 in two steps; the single power underflows.
            0 => fraction * 2f64.powi(-1022) * 2f64.powi(-52),
            _ => (1.0 + fraction * 2f64.powi(-52)) * 2f64.powi(exponent - 1023),
        };
        sign * magnitude
    }
}

impl ByteView for BitFieldView {
    fn read_u8(&self, buffer: &[u8], offset: usize) -> Result<u8, MeshError> {
        Ok(Self::bits(buffer, offset, 1, true)? as u8)
    }

    fn read_u16(&self, buffer: &[u8], offset: usize, little_endian: bool) -> Result<u16, MeshError> {
        Ok(Self::bits(buffer, offset, 2, little_endian)? as u16)
    }

    fn read_u32(&self, buffer: &[u8], offset: usize, little_endian: bool) -> Result<u32, MeshError> {
        Ok(Self::bits(buffer, offset, 4, little_endian)? as u32)
    }

    fn read_u64(&self, buffer: &[u8], offset: usize, little_endian: bool) -> Result<u64, MeshError> {
        Self::bits(buffer, offset, 8, little_endian)
    }

    fn read_f32(&self, buffer: &[u8], offset: usize, little_endian: bool) -> Result<f32, MeshError> {
        Ok(Self::decode_binary32(self.read_u32(buffer, offset, little_endian)?))
    }

    fn read_f64(&self, buffer: &[u8], offset: usize, little_endian: bool) -> Result<f64, MeshError> {
        Ok(Self::decode_binary64(self.read_u64(buffer, offset, little_endian)?))
    }
}
