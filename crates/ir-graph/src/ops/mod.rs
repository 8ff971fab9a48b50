//! Per-kind shape rules. Each function takes input shapes and the kind's
//! attributes and returns the output shape, or nothing when the inputs are
//! incompatible.

pub mod cast;
pub mod concat;
pub mod elementwise;
pub mod matmul;
pub mod transpose;
pub mod unary;

pub use cast::CastType;
pub use elementwise::BinaryKind;
pub use unary::UnaryKind;
