use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EgaError {
    #[error("target is {actual:?} but the bitmap is {expected:?}")]
    ShapeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("palette constraints leave no usable slots")]
    EmptyBudget,

    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    DimensionMismatch {
        len: usize,
        width: u32,
        height: u32,
    },

    #[error("binary bitmap serialization is not supported")]
    SerializationUnsupported,
}
