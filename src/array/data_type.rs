//! Zarr V2 element types.
//!
//! A [`DataType`] is the canonical in-memory element type resolved from a
//! [`TypeDescriptor`](crate::array::TypeDescriptor).

use thiserror::Error;

/// A data type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[rustfmt::skip]
pub enum DataType {
    /// `bool` Boolean.
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    UInt64,
    /// `float32` IEEE 754 single-precision floating point.
    Float32,
    /// `float64` IEEE 754 double-precision floating point.
    Float64,
    /// `complex64` real and imaginary components are each IEEE 754 single-precision floating point, interleaved.
    Complex64,
    /// `complex128` real and imaginary components are each IEEE 754 double-precision floating point, interleaved.
    Complex128,
    /// `r*` raw bytes of a declared width, for bit-packed or otherwise unsupported kinds.
    RawBits(usize), // the stored usize is the size in bytes
}

/// An unsupported data type error.
#[derive(Debug, Error)]
#[error("unsupported data type {_0}")]
pub struct UnsupportedDataTypeError(String);

impl From<String> for UnsupportedDataTypeError {
    fn from(data_type: String) -> Self {
        Self(data_type)
    }
}

impl DataType {
    /// Returns the identifier.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::Int8 => "int8".to_string(),
            Self::Int16 => "int16".to_string(),
            Self::Int32 => "int32".to_string(),
            Self::Int64 => "int64".to_string(),
            Self::UInt8 => "uint8".to_string(),
            Self::UInt16 => "uint16".to_string(),
            Self::UInt32 => "uint32".to_string(),
            Self::UInt64 => "uint64".to_string(),
            Self::Float32 => "float32".to_string(),
            Self::Float64 => "float64".to_string(),
            Self::Complex64 => "complex64".to_string(),
            Self::Complex128 => "complex128".to_string(),
            Self::RawBits(size) => format!("r{}", size * 8),
        }
    }

    /// Returns the size in bytes of an element of this data type.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::Complex64 => 8,
            Self::Complex128 => 16,
            Self::RawBits(size) => *size,
        }
    }

    /// Returns the width in bytes of the scalar components of this data type.
    ///
    /// This is the granularity at which byte order applies: 4 for `complex64`
    /// (two interleaved `float32` components), 1 for raw bytes.
    #[must_use]
    pub const fn component_size(&self) -> usize {
        match self {
            Self::Complex64 => 4,
            Self::Complex128 => 8,
            Self::RawBits(_) => 1,
            _ => self.size(),
        }
    }

    /// Create a data type from a canonical element type and a multiplicity.
    ///
    /// A multiplicity above one yields a raw byte blob wide enough for
    /// `multiplicity` elements, for multi-component pixels.
    #[must_use]
    pub const fn with_multiplicity(self, multiplicity: usize) -> DataType {
        if multiplicity <= 1 {
            self
        } else {
            DataType::RawBits(self.size() * multiplicity)
        }
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The Zarr "NaN" fill value bit pattern for `float32`.
pub const ZARR_NAN_F32: f32 = unsafe { std::mem::transmute::<u32, f32>(0x7fc0_0000) };

/// The Zarr "NaN" fill value bit pattern for `float64`.
pub const ZARR_NAN_F64: f64 =
    unsafe { std::mem::transmute::<u64, f64>(0x7ff8_0000_0000_0000) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_sizes() {
        assert_eq!(DataType::Bool.size(), 1);
        assert_eq!(DataType::UInt16.size(), 2);
        assert_eq!(DataType::Complex64.size(), 8);
        assert_eq!(DataType::Complex64.component_size(), 4);
        assert_eq!(DataType::Complex128.size(), 16);
        assert_eq!(DataType::RawBits(3).size(), 3);
        assert_eq!(DataType::RawBits(3).component_size(), 1);
    }

    #[test]
    fn data_type_names() {
        assert_eq!(DataType::Float64.name(), "float64");
        assert_eq!(DataType::RawBits(2).name(), "r16");
    }

    #[test]
    fn data_type_multiplicity() {
        assert_eq!(DataType::UInt8.with_multiplicity(1), DataType::UInt8);
        assert_eq!(DataType::UInt16.with_multiplicity(3), DataType::RawBits(6));
    }

    #[test]
    fn nan_bit_patterns() {
        assert_eq!(ZARR_NAN_F32.to_bits(), f32::NAN.to_bits());
        assert_eq!(ZARR_NAN_F64.to_bits(), f64::NAN.to_bits());
    }
}
