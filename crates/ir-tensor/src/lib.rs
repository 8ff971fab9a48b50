//! `ir-tensor` - Shape, dtype and index utilities for the tensor graph IR.
//!
//! This crate provides:
//! - `DType`, the closed set of element types with their byte sizes
//! - `Shape`, with broadcasting, axis normalization and flat/multi index
//!   conversion
//! - `TensorError`, the error type shared by the utilities

pub mod dtype;
pub mod error;
pub mod shape;

// Re-export primary types at the crate root for convenience.
pub use dtype::DType;
pub use error::{Result, TensorError};
pub use shape::{normalize_axis, Shape};
