use std::fmt;
use std::str::FromStr;

use ir_tensor::DType;

use crate::error::GraphError;

/// Conversion performed by a `Cast` operator, named `<From>2<To>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastType {
    Float2Float16,
    Float2Int64,
    Float2Int32,
    Float2Int16,
    Float2Int8,
    Int322Float,
    Int322Int8,
    Int322Int16,
    Int162Float,
    Int162Int32,
    Int82Float,
    Int82Int16,
    Int82Int32,
    Uint82Float,
    Uint82Int32,
    Uint82Int64,
    Int322Int64,
    Int642Int32,
    Int642Uint32,
    Int642Float,
    Uint322Int64,
    Float162Float,
    BFloat162Float,
    Float2BFloat16,
    Float2Float,
}

impl CastType {
    pub const ALL: [CastType; 25] = [
        CastType::Float2Float16,
        CastType::Float2Int64,
        CastType::Float2Int32,
        CastType::Float2Int16,
        CastType::Float2Int8,
        CastType::Int322Float,
        CastType::Int322Int8,
        CastType::Int322Int16,
        CastType::Int162Float,
        CastType::Int162Int32,
        CastType::Int82Float,
        CastType::Int82Int16,
        CastType::Int82Int32,
        CastType::Uint82Float,
        CastType::Uint82Int32,
        CastType::Uint82Int64,
        CastType::Int322Int64,
        CastType::Int642Int32,
        CastType::Int642Uint32,
        CastType::Int642Float,
        CastType::Uint322Int64,
        CastType::Float162Float,
        CastType::BFloat162Float,
        CastType::Float2BFloat16,
        CastType::Float2Float,
    ];

    /// Tag name, source dtype, target dtype.
    fn signature(&self) -> (&'static str, DType, DType) {
        match self {
            CastType::Float2Float16 => ("Float2Float16", DType::Float32, DType::Float16),
            CastType::Float2Int64 => ("Float2Int64", DType::Float32, DType::Int64),
            CastType::Float2Int32 => ("Float2Int32", DType::Float32, DType::Int32),
            CastType::Float2Int16 => ("Float2Int16", DType::Float32, DType::Int16),
            CastType::Float2Int8 => ("Float2Int8", DType::Float32, DType::Int8),
            CastType::Int322Float => ("Int322Float", DType::Int32, DType::Float32),
            CastType::Int322Int8 => ("Int322Int8", DType::Int32, DType::Int8),
            CastType::Int322Int16 => ("Int322Int16", DType::Int32, DType::Int16),
            CastType::Int162Float => ("Int162Float", DType::Int16, DType::Float32),
            CastType::Int162Int32 => ("Int162Int32", DType::Int16, DType::Int32),
            CastType::Int82Float => ("Int82Float", DType::Int8, DType::Float32),
            CastType::Int82Int16 => ("Int82Int16", DType::Int8, DType::Int16),
            CastType::Int82Int32 => ("Int82Int32", DType::Int8, DType::Int32),
            CastType::Uint82Float => ("Uint82Float", DType::UInt8, DType::Float32),
            CastType::Uint82Int32 => ("Uint82Int32", DType::UInt8, DType::Int32),
            CastType::Uint82Int64 => ("Uint82Int64", DType::UInt8, DType::Int64),
            CastType::Int322Int64 => ("Int322Int64", DType::Int32, DType::Int64),
            CastType::Int642Int32 => ("Int642Int32", DType::Int64, DType::Int32),
            CastType::Int642Uint32 => ("Int642Uint32", DType::Int64, DType::UInt32),
            CastType::Int642Float => ("Int642Float", DType::Int64, DType::Float32),
            CastType::Uint322Int64 => ("Uint322Int64", DType::UInt32, DType::Int64),
            CastType::Float162Float => ("Float162Float", DType::Float16, DType::Float32),
            CastType::BFloat162Float => ("BFloat162Float", DType::BFloat16, DType::Float32),
            CastType::Float2BFloat16 => ("Float2BFloat16", DType::Float32, DType::BFloat16),
            CastType::Float2Float => ("Float2Float", DType::Float32, DType::Float32),
        }
    }

    pub fn name(&self) -> &'static str {
        self.signature().0
    }

    /// Element type the cast expects on its input.
    pub fn input_dtype(&self) -> DType {
        self.signature().1
    }

    /// Element type the cast produces.
    pub fn output_dtype(&self) -> DType {
        self.signature().2
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CastType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CastType::ALL
            .iter()
            .copied()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| GraphError::UnsupportedCast(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dtype() {
        assert_eq!(CastType::Float2Int32.output_dtype(), DType::Int32);
        assert_eq!(CastType::Int642Uint32.output_dtype(), DType::UInt32);
        assert_eq!(CastType::Float162Float.output_dtype(), DType::Float32);
        assert_eq!(CastType::Float2BFloat16.output_dtype(), DType::BFloat16);
    }

    #[test]
    fn test_names_are_unique() {
        let all = CastType::ALL;
        for ty in &all {
            assert_eq!(all.iter().filter(|t| *t == ty).count(), 1);
            assert_eq!(all.iter().filter(|t| t.name() == ty.name()).count(), 1);
        }
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!("Float2Int32".parse::<CastType>().unwrap(), CastType::Float2Int32);
        assert_eq!("Int642Uint32".parse::<CastType>().unwrap(), CastType::Int642Uint32);
        for ty in CastType::ALL {
            assert_eq!(ty.name().parse::<CastType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(
            "Float2Complex".parse::<CastType>(),
            Err(GraphError::UnsupportedCast("Float2Complex".to_string()))
        );
    }
}
