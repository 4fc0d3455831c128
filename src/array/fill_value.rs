//! Zarr V2 fill values.
//!
//! A fill value provides an element value for chunks with no backing data and
//! for the padding region of boundary chunks.

use thiserror::Error;

use super::{
    data_type::{ZARR_NAN_F32, ZARR_NAN_F64},
    DataType, TypeDescriptor,
};

/// The fill value of an array, as the native-byte-order bytes of one element.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        FillValue(value)
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        FillValue(vec![u8::from(value)])
    }
}

macro_rules! impl_fill_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    FillValue(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}
impl_fill_value_from!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> FillValue {
        FillValue(bytes)
    }

    /// Create an all-zero fill value for `data_type`.
    #[must_use]
    pub fn zeros(data_type: &DataType) -> FillValue {
        FillValue(vec![0u8; data_type.size()])
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Compute the fill value for `metadata` and `descriptor`.
    ///
    /// A null fill value means zero.
    /// The `NaN`, `Infinity` and `-Infinity` tokens produce the IEEE bit
    /// patterns at float widths and zero bytes for any other data type.
    /// Numeric literals are parsed per data type: signed parsing for signed
    /// integers, masking to the low byte for `uint8`, and genuinely unsigned
    /// parses for the wider unsigned types.
    ///
    /// # Errors
    /// Returns a [`FillValueParseError`] if the literal cannot be parsed for
    /// the data type. See [`FillValue::from_metadata_lossy`] for the tolerant
    /// variant used when reading existing containers.
    pub fn from_metadata(
        metadata: &FillValueMetadataV2,
        descriptor: &TypeDescriptor,
    ) -> Result<FillValue, FillValueParseError> {
        let data_type = descriptor.data_type();
        let err = || FillValueParseError::new(metadata.clone(), descriptor.to_string());
        match metadata {
            FillValueMetadataV2::Null => Ok(Self::zeros(&data_type)),
            FillValueMetadataV2::NaN => Ok(match data_type {
                DataType::Float32 => Self::from(ZARR_NAN_F32),
                DataType::Float64 => Self::from(ZARR_NAN_F64),
                _ => Self::zeros(&data_type),
            }),
            FillValueMetadataV2::Infinity => Ok(match data_type {
                DataType::Float32 => Self::from(f32::INFINITY),
                DataType::Float64 => Self::from(f64::INFINITY),
                _ => Self::zeros(&data_type),
            }),
            FillValueMetadataV2::NegInfinity => Ok(match data_type {
                DataType::Float32 => Self::from(f32::NEG_INFINITY),
                DataType::Float64 => Self::from(f64::NEG_INFINITY),
                _ => Self::zeros(&data_type),
            }),
            FillValueMetadataV2::Number(number) => {
                Self::from_literal(&number.to_string(), &data_type).ok_or_else(err)
            }
            FillValueMetadataV2::String(literal) => {
                Self::from_literal(literal, &data_type).ok_or_else(err)
            }
        }
    }

    /// Tolerant variant of [`FillValue::from_metadata`].
    ///
    /// A parse failure substitutes all-zero bytes and emits a [`log::warn!`]
    /// instead of propagating the error, to stay readable on slightly
    /// malformed containers.
    #[must_use]
    pub fn from_metadata_lossy(
        metadata: &FillValueMetadataV2,
        descriptor: &TypeDescriptor,
    ) -> FillValue {
        Self::from_metadata(metadata, descriptor).unwrap_or_else(|err| {
            log::warn!("substituting zero fill value: {err}");
            Self::zeros(&descriptor.data_type())
        })
    }

    fn from_literal(literal: &str, data_type: &DataType) -> Option<FillValue> {
        match data_type {
            DataType::Bool => match literal {
                "true" | "1" => Some(Self::from(true)),
                "false" | "0" => Some(Self::from(false)),
                _ => None,
            },
            DataType::Int8 => literal.parse::<i8>().ok().map(Self::from),
            DataType::Int16 => literal.parse::<i16>().ok().map(Self::from),
            DataType::Int32 => literal.parse::<i32>().ok().map(Self::from),
            DataType::Int64 => literal.parse::<i64>().ok().map(Self::from),
            // uint8 masks a wider signed parse to the low byte, matching the
            // masking behaviour of existing writers at that width. The wider
            // unsigned types parse unsigned, so negative or overflowing
            // literals are parse failures rather than silent truncations.
            DataType::UInt8 => literal.parse::<i64>().ok().map(|v| Self::from(v as u8)),
            DataType::UInt16 => literal.parse::<u16>().ok().map(Self::from),
            DataType::UInt32 => literal.parse::<u32>().ok().map(Self::from),
            DataType::UInt64 => literal.parse::<u64>().ok().map(Self::from),
            DataType::Float32 => literal.parse::<f32>().ok().map(Self::from),
            DataType::Float64 => literal.parse::<f64>().ok().map(Self::from),
            DataType::Complex64 | DataType::Complex128 | DataType::RawBits(_) => {
                // Only a zero literal is meaningful for opaque widths.
                match literal.parse::<f64>() {
                    Ok(v) if v == 0.0 => Some(Self::zeros(data_type)),
                    _ => None,
                }
            }
        }
    }
}

/// A fill value parse failure.
#[derive(Debug, Error)]
#[error("fill value {fill_value:?} is incompatible with data type {dtype}")]
pub struct FillValueParseError {
    fill_value: FillValueMetadataV2,
    dtype: String,
}

impl FillValueParseError {
    fn new(fill_value: FillValueMetadataV2, dtype: String) -> Self {
        Self { fill_value, dtype }
    }
}

/// The `fill_value` field of a `.zarray` document.
///
/// A scalar value for uninitialised portions of the array, or null meaning
/// zero. Writers in the wild store it as a JSON number or as a decimal
/// string; both forms are accepted and round-trip unchanged.
#[derive(Clone, PartialEq, Debug)]
pub enum FillValueMetadataV2 {
    /// No fill value, meaning zero.
    Null,
    /// NaN (not-a-number).
    NaN,
    /// Positive infinity.
    Infinity,
    /// Negative infinity.
    NegInfinity,
    /// A number.
    Number(serde_json::Number),
    /// A decimal literal stored as a string.
    String(String),
}

impl Default for FillValueMetadataV2 {
    fn default() -> Self {
        Self::Null
    }
}

impl<'de> serde::Deserialize<'de> for FillValueMetadataV2 {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum FillValueMetadataV2Type {
            String(String),
            Number(serde_json::Number),
            Null,
        }
        let fill_value = FillValueMetadataV2Type::deserialize(d)?;
        match fill_value {
            FillValueMetadataV2Type::String(string) => match string.as_str() {
                "NaN" => Ok(Self::NaN),
                "Infinity" => Ok(Self::Infinity),
                "-Infinity" => Ok(Self::NegInfinity),
                _ => Ok(Self::String(string)),
            },
            FillValueMetadataV2Type::Number(number) => Ok(Self::Number(number)),
            FillValueMetadataV2Type::Null => Ok(Self::Null),
        }
    }
}

impl serde::Serialize for FillValueMetadataV2 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::NaN => serializer.serialize_str("NaN"),
            Self::Infinity => serializer.serialize_str("Infinity"),
            Self::NegInfinity => serializer.serialize_str("-Infinity"),
            Self::Number(number) => number.serialize(serializer),
            Self::String(string) => serializer.serialize_str(string),
        }
    }
}
