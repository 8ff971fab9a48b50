use std::fmt;

use ir_tensor::Shape;

/// Single-input, shape-preserving activation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryKind {
    Relu,
    Sigmoid,
    Tanh,
    Abs,
    Neg,
    Sqrt,
    Exp,
}

impl UnaryKind {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryKind::Relu => "Relu",
            UnaryKind::Sigmoid => "Sigmoid",
            UnaryKind::Tanh => "Tanh",
            UnaryKind::Abs => "Abs",
            UnaryKind::Neg => "Neg",
            UnaryKind::Sqrt => "Sqrt",
            UnaryKind::Exp => "Exp",
        }
    }
}

impl fmt::Display for UnaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unary and clip operators never change the shape.
pub fn infer_shape(input: &Shape) -> Option<Shape> {
    Some(input.clone())
}
