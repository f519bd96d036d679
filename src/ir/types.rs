use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeCode { Int, UInt, Float, Handle }

/// The element type of an expression: a scalar of `bits` width,
/// or a vector of `lanes` such scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Type {
    pub code: TypeCode,
    pub bits: u8,
    pub lanes: u16
}

impl Type {
    pub const fn new(code: TypeCode, bits: u8, lanes: u16) -> Type {
        Type { code, bits, lanes }
    }

    pub const fn int(bits: u8) -> Type {
        Type::new(TypeCode::Int, bits, 1)
    }

    pub const fn uint(bits: u8) -> Type {
        Type::new(TypeCode::UInt, bits, 1)
    }

    pub const fn float(bits: u8) -> Type {
        Type::new(TypeCode::Float, bits, 1)
    }

    pub const fn bool_() -> Type {
        Type::uint(1)
    }

    pub const fn handle() -> Type {
        Type::new(TypeCode::Handle, 64, 1)
    }

    pub const fn with_lanes(self, lanes: u16) -> Type {
        Type { lanes, ..self }
    }

    /// Storage size of one element. Sub-byte types round up.
    pub fn bytes(&self) -> i64 {
        ((self.bits as i64 + 7) / 8) * self.lanes as i64
    }

    pub fn is_int(&self) -> bool {
        self.code == TypeCode::Int
    }

    pub fn is_uint(&self) -> bool {
        self.code == TypeCode::UInt
    }

    pub fn is_float(&self) -> bool {
        self.code == TypeCode::Float
    }

    pub fn is_bool(&self) -> bool {
        self.is_uint() && self.bits == 1
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_bool() {
            write!(f, "bool")?;
        } else {
            match self.code {
                TypeCode::Int => write!(f, "int{}", self.bits)?,
                TypeCode::UInt => write!(f, "uint{}", self.bits)?,
                TypeCode::Float => write!(f, "float{}", self.bits)?,
                TypeCode::Handle => write!(f, "handle")?
            }
        }
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

/// How a loop is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForType {
    Serial,
    Parallel,
    Vectorized,
    Unrolled
}

/// The device a loop runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAPI {
    /// Inherit the device of the enclosing loop. The default.
    Parent,
    Host,
    DefaultGpu,
    Cuda,
    OpenCL,
    Glsl,
    Renderscript
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Type::bool_(), 1; "bool")]
    #[test_case(Type::uint(8), 1; "uint8")]
    #[test_case(Type::int(16), 2; "int16")]
    #[test_case(Type::float(32), 4; "float32")]
    #[test_case(Type::float(32).with_lanes(8), 32; "float32x8")]
    fn test_bytes(t: Type, expected: i64) {
        assert_eq!(t.bytes(), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::int(32).to_string(), "int32");
        assert_eq!(Type::bool_().to_string(), "bool");
        assert_eq!(Type::uint(8).with_lanes(4).to_string(), "uint8x4");
    }
}
