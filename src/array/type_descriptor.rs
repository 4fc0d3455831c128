//! Zarr V2 type descriptors.
//!
//! A type descriptor is the compact `<endian><kind><width>` string in the
//! `dtype` field of a `.zarray` document (e.g. `<f4`, `>u2`, `|i1`).

use serde::Deserialize;
use thiserror::Error;

use super::{DataType, Endianness};

/// The primitive kind of a type descriptor.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TypeKind {
    /// `t` bit field, width in bits.
    Bit,
    /// `b` boolean.
    Bool,
    /// `i` signed integer.
    Int,
    /// `u` unsigned integer.
    UInt,
    /// `f` IEEE 754 floating point.
    Float,
    /// `c` complex floating point, interleaved real and imaginary components.
    ComplexFloat,
    /// `m` timedelta.
    TimeDelta,
    /// `M` datetime.
    DateTime,
    /// `O` Python object reference.
    Object,
    /// `S` byte string.
    String,
    /// `U` unicode string.
    Unicode,
    /// `V` other (void, a fixed-size chunk of memory).
    Other,
}

impl TypeKind {
    /// The kind letter as it appears in a type descriptor.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Bit => 't',
            Self::Bool => 'b',
            Self::Int => 'i',
            Self::UInt => 'u',
            Self::Float => 'f',
            Self::ComplexFloat => 'c',
            Self::TimeDelta => 'm',
            Self::DateTime => 'M',
            Self::Object => 'O',
            Self::String => 'S',
            Self::Unicode => 'U',
            Self::Other => 'V',
        }
    }

    const fn from_char(c: char) -> Option<Self> {
        match c {
            't' => Some(Self::Bit),
            'b' => Some(Self::Bool),
            'i' => Some(Self::Int),
            'u' => Some(Self::UInt),
            'f' => Some(Self::Float),
            'c' => Some(Self::ComplexFloat),
            'm' => Some(Self::TimeDelta),
            'M' => Some(Self::DateTime),
            'O' => Some(Self::Object),
            'S' => Some(Self::String),
            'U' => Some(Self::Unicode),
            'V' => Some(Self::Other),
            _ => None,
        }
    }
}

/// A malformed type descriptor error.
#[derive(Debug, Error)]
pub enum TypeDescriptorError {
    /// The descriptor has fewer than three characters.
    #[error("type descriptor {_0:?} is too short, expected <endian><kind><width>")]
    TooShort(String),
    /// The byte order prefix is not `<`, `>` or `|`.
    #[error("type descriptor {_0:?} must begin with |, < or >")]
    InvalidEndianness(String),
    /// The kind letter is not recognised.
    #[error("type descriptor {_0:?} has an unrecognised kind letter")]
    UnknownKind(String),
    /// The width suffix is not a positive decimal integer.
    #[error("type descriptor {_0:?} has a non-numeric width suffix")]
    InvalidWidth(String),
}

/// A parsed type descriptor.
///
/// Parsing preserves the original token, so a descriptor always serialises to
/// the exact string it was parsed from.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TypeDescriptor {
    token: String,
    endianness: Option<Endianness>,
    kind: TypeKind,
    width: usize,
}

impl TypeDescriptor {
    /// Parse a type descriptor from its compact string form.
    ///
    /// # Errors
    /// Returns a [`TypeDescriptorError`] if the string is shorter than three
    /// characters, has an invalid byte order prefix or kind letter, or a
    /// non-numeric width suffix.
    pub fn parse(descriptor: &str) -> Result<Self, TypeDescriptorError> {
        if descriptor.chars().count() < 3 {
            return Err(TypeDescriptorError::TooShort(descriptor.to_string()));
        }
        let mut chars = descriptor.chars();
        let endianness = match chars.next() {
            Some('<') => Some(Endianness::Little),
            Some('>') => Some(Endianness::Big),
            Some('|') => None,
            _ => {
                return Err(TypeDescriptorError::InvalidEndianness(
                    descriptor.to_string(),
                ))
            }
        };
        let kind = chars
            .next()
            .and_then(TypeKind::from_char)
            .ok_or_else(|| TypeDescriptorError::UnknownKind(descriptor.to_string()))?;
        let width: usize = chars
            .as_str()
            .parse()
            .map_err(|_| TypeDescriptorError::InvalidWidth(descriptor.to_string()))?;
        // A declared width of zero falls back to one byte.
        let width = if width == 0 { 1 } else { width };
        Ok(Self {
            token: descriptor.to_string(),
            endianness,
            kind,
            width,
        })
    }

    /// Create a canonical descriptor for a [`DataType`] with the given byte order.
    ///
    /// Single-byte types take the `|` (not applicable) byte order prefix.
    #[must_use]
    pub fn from_data_type(data_type: &DataType, endianness: Endianness) -> Self {
        let (kind, width) = match data_type {
            DataType::Bool => (TypeKind::Bool, 1),
            DataType::Int8 => (TypeKind::Int, 1),
            DataType::Int16 => (TypeKind::Int, 2),
            DataType::Int32 => (TypeKind::Int, 4),
            DataType::Int64 => (TypeKind::Int, 8),
            DataType::UInt8 => (TypeKind::UInt, 1),
            DataType::UInt16 => (TypeKind::UInt, 2),
            DataType::UInt32 => (TypeKind::UInt, 4),
            DataType::UInt64 => (TypeKind::UInt, 8),
            DataType::Float32 => (TypeKind::Float, 4),
            DataType::Float64 => (TypeKind::Float, 8),
            DataType::Complex64 => (TypeKind::ComplexFloat, 8),
            DataType::Complex128 => (TypeKind::ComplexFloat, 16),
            DataType::RawBits(size) => (TypeKind::Other, *size),
        };
        let (endianness, endian_char) = if width == 1 || matches!(kind, TypeKind::Other) {
            (None, '|')
        } else {
            (Some(endianness), endianness.as_char())
        };
        Self {
            token: format!("{endian_char}{}{width}", kind.as_char()),
            endianness,
            kind,
            width,
        }
    }

    /// The declared byte order, or [`None`] for the `|` (not applicable) prefix.
    #[must_use]
    pub const fn endianness(&self) -> Option<Endianness> {
        self.endianness
    }

    /// The byte order applied to multi-byte elements.
    ///
    /// A `|` prefix is treated as big endian for multi-byte safety.
    #[must_use]
    pub fn effective_endianness(&self) -> Endianness {
        self.endianness.unwrap_or(Endianness::Big)
    }

    /// The primitive kind.
    #[must_use]
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// The element width in bytes, or 0 for the bit kind.
    #[must_use]
    pub const fn width_bytes(&self) -> usize {
        match self.kind {
            TypeKind::Bit => 0,
            _ => self.width,
        }
    }

    /// The element width in bits, or 0 for byte-width kinds.
    #[must_use]
    pub const fn width_bits(&self) -> usize {
        match self.kind {
            TypeKind::Bit => self.width,
            _ => 0,
        }
    }

    /// Resolve the nearest [`DataType`] for this descriptor.
    ///
    /// Exact matches only; unmatched integer widths fall back to the one-byte
    /// variant of the same signedness, unmatched float and complex widths fall
    /// back to a raw byte blob of the declared width.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self.kind {
            TypeKind::Bool => DataType::Bool,
            TypeKind::Int => match self.width {
                1 => DataType::Int8,
                2 => DataType::Int16,
                4 => DataType::Int32,
                8 => DataType::Int64,
                _ => DataType::Int8,
            },
            TypeKind::UInt => match self.width {
                1 => DataType::UInt8,
                2 => DataType::UInt16,
                4 => DataType::UInt32,
                8 => DataType::UInt64,
                _ => DataType::UInt8,
            },
            TypeKind::Float => match self.width {
                4 => DataType::Float32,
                8 => DataType::Float64,
                _ => DataType::RawBits(self.width),
            },
            TypeKind::ComplexFloat => match self.width {
                8 => DataType::Complex64,
                16 => DataType::Complex128,
                _ => DataType::RawBits(self.width),
            },
            TypeKind::Bit => DataType::RawBits(self.width.div_ceil(8).max(1)),
            TypeKind::TimeDelta
            | TypeKind::DateTime
            | TypeKind::Object
            | TypeKind::String
            | TypeKind::Unicode
            | TypeKind::Other => DataType::RawBits(self.width),
        }
    }

    /// Allocate a zeroed buffer for `num_elements` elements of this type.
    ///
    /// Bit-kind descriptors pack to `ceil(num_elements * width_bits / 8)` bytes.
    #[must_use]
    pub fn create_buffer(&self, num_elements: usize) -> Vec<u8> {
        let len = match self.kind {
            TypeKind::Bit => (num_elements * self.width).div_ceil(8),
            _ => num_elements * self.data_type().size(),
        };
        vec![0u8; len]
    }
}

impl core::fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.token)
    }
}

impl TryFrom<&str> for TypeDescriptor {
    type Error = TypeDescriptorError;

    fn try_from(descriptor: &str) -> Result<Self, Self::Error> {
        Self::parse(descriptor)
    }
}

impl serde::Serialize for TypeDescriptor {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.token)
    }
}

impl<'de> serde::Deserialize<'de> for TypeDescriptor {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let token = String::deserialize(d)?;
        Self::parse(&token).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_parse_valid() {
        let dtype = TypeDescriptor::parse("<f4").unwrap();
        assert_eq!(dtype.endianness(), Some(Endianness::Little));
        assert_eq!(dtype.kind(), TypeKind::Float);
        assert_eq!(dtype.width_bytes(), 4);
        assert_eq!(dtype.width_bits(), 0);
        assert_eq!(dtype.data_type(), DataType::Float32);

        let dtype = TypeDescriptor::parse(">u2").unwrap();
        assert_eq!(dtype.endianness(), Some(Endianness::Big));
        assert_eq!(dtype.data_type(), DataType::UInt16);

        let dtype = TypeDescriptor::parse("|i1").unwrap();
        assert_eq!(dtype.endianness(), None);
        assert_eq!(dtype.effective_endianness(), Endianness::Big);
        assert_eq!(dtype.data_type(), DataType::Int8);
    }

    #[test]
    fn descriptor_parse_invalid() {
        assert!(matches!(
            TypeDescriptor::parse("<f"),
            Err(TypeDescriptorError::TooShort(_))
        ));
        assert!(matches!(
            TypeDescriptor::parse("=f4"),
            Err(TypeDescriptorError::InvalidEndianness(_))
        ));
        assert!(matches!(
            TypeDescriptor::parse("<x4"),
            Err(TypeDescriptorError::UnknownKind(_))
        ));
        assert!(matches!(
            TypeDescriptor::parse("<f4x"),
            Err(TypeDescriptorError::InvalidWidth(_))
        ));
    }

    #[test]
    fn descriptor_round_trip() {
        for token in ["<f4", ">u2", "|i1", "<c16", ">m8", "|V7", "|t12"] {
            let dtype = TypeDescriptor::parse(token).unwrap();
            assert_eq!(dtype.to_string(), token);
            assert_eq!(
                TypeDescriptor::parse(&dtype.to_string()).unwrap(),
                dtype
            );
        }
    }

    #[test]
    fn descriptor_fallbacks() {
        // Unmatched integer widths fall back to the one-byte variant.
        assert_eq!(
            TypeDescriptor::parse("<i3").unwrap().data_type(),
            DataType::Int8
        );
        assert_eq!(
            TypeDescriptor::parse(">u7").unwrap().data_type(),
            DataType::UInt8
        );
        // Unmatched float widths fall back to raw bytes.
        assert_eq!(
            TypeDescriptor::parse("<f2").unwrap().data_type(),
            DataType::RawBits(2)
        );
        assert_eq!(
            TypeDescriptor::parse("<c32").unwrap().data_type(),
            DataType::RawBits(32)
        );
        // Datetime and friends are opaque blobs of the declared width.
        assert_eq!(
            TypeDescriptor::parse(">M8").unwrap().data_type(),
            DataType::RawBits(8)
        );
    }

    #[test]
    fn descriptor_bit_kind() {
        let dtype = TypeDescriptor::parse("|t12").unwrap();
        assert_eq!(dtype.width_bytes(), 0);
        assert_eq!(dtype.width_bits(), 12);
        // 5 elements of 12 bits pack into ceil(60 / 8) = 8 bytes.
        assert_eq!(dtype.create_buffer(5).len(), 8);
    }

    #[test]
    fn descriptor_from_data_type() {
        let dtype = TypeDescriptor::from_data_type(&DataType::UInt16, Endianness::Little);
        assert_eq!(dtype.to_string(), "<u2");
        let dtype = TypeDescriptor::from_data_type(&DataType::Int8, Endianness::Little);
        assert_eq!(dtype.to_string(), "|i1");
        let dtype = TypeDescriptor::from_data_type(&DataType::RawBits(6), Endianness::Big);
        assert_eq!(dtype.to_string(), "|V6");
    }

    #[test]
    fn descriptor_create_buffer() {
        let dtype = TypeDescriptor::parse("<u2").unwrap();
        assert_eq!(dtype.create_buffer(10).len(), 20);
    }
}
