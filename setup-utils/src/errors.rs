use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Hash to curve failed: {0}")]
    HashToCurve(String),

    #[error("Point {index} is not in the prime order subgroup")]
    IncorrectSubgroup { index: usize },

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Invalid length, expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Bytes do not encode a compressed curve point")]
    InvalidPoint,

    #[error("Secret does not decode to a non-zero scalar")]
    InvalidSecret,

    #[error("Point {index} is the point at infinity")]
    PointAtInfinity { index: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] ark_serialize::SerializationError),
}
