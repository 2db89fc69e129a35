use core::fmt;
use std::{
    num::{ParseFloatError, ParseIntError},
    str::Utf8Error,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Malformed PLY header: {0}")]
    MalformedHeader(String),

    #[error("Unsupported PLY format: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown property type: {0}")]
    UnknownPropertyType(String),

    #[error("Truncated input: {0}")]
    TruncatedInput(String),

    #[error("Read of {width} bytes at offset {offset} is out of bounds for a buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("Unsupported face arity {0}: faces must have 3 or 4 vertices")]
    UnsupportedFaceArity(usize),

    #[error("Face index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Malformed STL: {0}")]
    MalformedStl(String),

    #[error("Property type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Error parsing integer: {0}")]
    ParseInt(#[from] ParseIntError),

    #[error("Error parsing float: {0}")]
    ParseFloat(#[from] ParseFloatError),

    #[error("Invalid ascii data: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    #[error("Record deserialization error: {0}")]
    Serde(String),
}

impl serde::de::Error for MeshError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        MeshError::Serde(msg.to_string())
    }
}
