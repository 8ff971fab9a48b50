use std::fmt;

/// Element data types a graph tensor may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Float32,
    /// IEEE 754 half precision (`half::f16`).
    Float16,
    /// Brain floating point (`half::bf16`).
    BFloat16,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Bool,
}

impl DType {
    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::Float32 => std::mem::size_of::<f32>(),
            DType::Float16 => std::mem::size_of::<half::f16>(),
            DType::BFloat16 => std::mem::size_of::<half::bf16>(),
            DType::Float64 => std::mem::size_of::<f64>(),
            DType::Int8 => std::mem::size_of::<i8>(),
            DType::Int16 => std::mem::size_of::<i16>(),
            DType::Int32 => std::mem::size_of::<i32>(),
            DType::Int64 => std::mem::size_of::<i64>(),
            DType::UInt8 => std::mem::size_of::<u8>(),
            DType::UInt16 => std::mem::size_of::<u16>(),
            DType::UInt32 => std::mem::size_of::<u32>(),
            DType::UInt64 => std::mem::size_of::<u64>(),
            DType::Bool => std::mem::size_of::<bool>(),
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            DType::Float32 | DType::Float16 | DType::BFloat16 | DType::Float64
        )
    }

    pub fn is_signed_int(&self) -> bool {
        matches!(self, DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64)
    }

    pub fn is_unsigned_int(&self) -> bool {
        matches!(
            self,
            DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64
        )
    }

    /// Whether both types are floats, both signed or both unsigned
    /// integers. `Bool` shares a class only with itself.
    pub fn same_class(&self, other: DType) -> bool {
        (self.is_float() && other.is_float())
            || (self.is_signed_int() && other.is_signed_int())
            || (self.is_unsigned_int() && other.is_unsigned_int())
            || (*self == DType::Bool && other == DType::Bool)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::Float32 => "f32",
            DType::Float16 => "f16",
            DType::BFloat16 => "bf16",
            DType::Float64 => "f64",
            DType::Int8 => "i8",
            DType::Int16 => "i16",
            DType::Int32 => "i32",
            DType::Int64 => "i64",
            DType::UInt8 => "u8",
            DType::UInt16 => "u16",
            DType::UInt32 => "u32",
            DType::UInt64 => "u64",
            DType::Bool => "bool",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_bytes() {
        assert_eq!(DType::Float32.size_in_bytes(), 4);
        assert_eq!(DType::Float16.size_in_bytes(), 2);
        assert_eq!(DType::BFloat16.size_in_bytes(), 2);
        assert_eq!(DType::Float64.size_in_bytes(), 8);
        assert_eq!(DType::Int8.size_in_bytes(), 1);
        assert_eq!(DType::UInt32.size_in_bytes(), 4);
        assert_eq!(DType::Int64.size_in_bytes(), 8);
        assert_eq!(DType::Bool.size_in_bytes(), 1);
    }

    #[test]
    fn test_classes() {
        assert!(DType::BFloat16.is_float());
        assert!(DType::Int16.is_signed_int());
        assert!(DType::UInt8.is_unsigned_int());
        assert!(!DType::Bool.is_float());
    }

    #[test]
    fn test_same_class() {
        assert!(DType::Float16.same_class(DType::Float64));
        assert!(DType::Int8.same_class(DType::Int64));
        assert!(DType::UInt32.same_class(DType::UInt8));
        assert!(DType::Bool.same_class(DType::Bool));
        assert!(!DType::Int32.same_class(DType::UInt32));
        assert!(!DType::Float32.same_class(DType::Int32));
        assert!(!DType::Bool.same_class(DType::UInt8));
    }
}
