//! Zarr V2 compressors.
//!
//! The supported compressors form a closed set dispatched on the `id`
//! discriminator of the compressor JSON object: `raw`, `gzip`, `zlib`
//! (the gzip family with a zlib container), `bz2` and `blosc`.
//! Compression parameters are owned here and passed through unchanged to the
//! underlying codec implementations; this module owns only the parameter
//! schema and its JSON (de)serialisation.

#[cfg(feature = "blosc")]
mod blosc;
#[cfg(feature = "bz2")]
mod bz2;
#[cfg(feature = "gzip")]
mod gzip;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

use super::metadata::CompressorMetadataV2;

/// A compressor for chunk byte streams.
///
/// `Raw` is the identity codec. An absent (`null`) compressor in array
/// metadata is an explicit absence rather than `Raw`; see
/// [`ArrayMetadataV2::compressor`](crate::array::ArrayMetadataV2).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Compressor {
    /// The identity codec.
    Raw,
    /// The gzip family, covering the `gzip` and `zlib` container formats.
    Gzip(GzipCompressorConfiguration),
    /// bzip2.
    Bz2(Bz2CompressorConfiguration),
    /// The blosc meta-compressor.
    Blosc(BloscCompressorConfiguration),
}

/// An unrecognised compressor `id` error.
///
/// Fatal when encoding or decoding chunks; tolerated as "unspecified" when
/// merely reading attributes for display.
#[derive(Debug, Error)]
#[error("unknown compressor id {_0:?}")]
pub struct UnknownCompressorError(String);

impl UnknownCompressorError {
    /// The unrecognised id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error from the underlying codec implementation.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The compressor requires a cargo feature that is not enabled.
    #[error("the {_0} compressor requires the {_0} cargo feature")]
    MissingFeature(&'static str),
    /// A decoded chunk did not have the expected size.
    #[error("decoded chunk has {_0} bytes, expected {_1}")]
    UnexpectedChunkSize(usize, usize),
    /// Any other codec failure.
    #[error("{_0}")]
    Other(String),
}

impl Compressor {
    /// The `id` discriminator this compressor serialises with.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Gzip(configuration) => {
                if configuration.use_zlib_container {
                    "zlib"
                } else {
                    "gzip"
                }
            }
            Self::Bz2(_) => "bz2",
            Self::Blosc(_) => "blosc",
        }
    }

    /// Create a compressor from raw compressor metadata, dispatching on `id`.
    ///
    /// # Errors
    /// Returns [`UnknownCompressorError`] if the id is not recognised or its
    /// parameters do not match the schema for that id.
    pub fn from_metadata(
        metadata: &CompressorMetadataV2,
    ) -> Result<Self, UnknownCompressorError> {
        let err = || UnknownCompressorError(metadata.id().to_string());
        let configuration =
            serde_json::Value::Object(metadata.configuration().clone());
        match metadata.id() {
            "raw" => Ok(Self::Raw),
            "gzip" => serde_json::from_value::<GzipCompressorConfiguration>(configuration)
                .map(Self::Gzip)
                .map_err(|_| err()),
            "zlib" => serde_json::from_value::<GzipCompressorConfiguration>(configuration)
                .map(|configuration| {
                    Self::Gzip(GzipCompressorConfiguration {
                        use_zlib_container: true,
                        ..configuration
                    })
                })
                .map_err(|_| err()),
            "bz2" => serde_json::from_value::<Bz2CompressorConfiguration>(configuration)
                .map(Self::Bz2)
                .map_err(|_| err()),
            "blosc" => serde_json::from_value::<BloscCompressorConfiguration>(configuration)
                .map(Self::Blosc)
                .map_err(|_| err()),
            _ => Err(err()),
        }
    }

    /// Convert this compressor to raw compressor metadata.
    ///
    /// # Panics
    /// Panics if a configuration does not serialise to a JSON object, which
    /// cannot happen for the configurations in this module.
    #[must_use]
    pub fn to_metadata(&self) -> CompressorMetadataV2 {
        let configuration = match self {
            Self::Raw => serde_json::Value::Object(serde_json::Map::new()),
            Self::Gzip(configuration) => serde_json::to_value(configuration).unwrap(),
            Self::Bz2(configuration) => serde_json::to_value(configuration).unwrap(),
            Self::Blosc(configuration) => serde_json::to_value(configuration).unwrap(),
        };
        let serde_json::Value::Object(configuration) = configuration else {
            unreachable!("compressor configurations serialise to JSON objects")
        };
        CompressorMetadataV2::new(self.id(), configuration)
    }

    /// Compress `decoded` bytes.
    ///
    /// `element_size` is the byte width of one element, consumed by blosc
    /// shuffling and ignored by the other compressors.
    ///
    /// # Errors
    /// Returns a [`CodecError`] on a codec failure or if the required cargo
    /// feature is disabled.
    pub fn encode(&self, decoded: Vec<u8>, element_size: usize) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Raw => Ok(decoded),
            #[cfg(feature = "gzip")]
            Self::Gzip(configuration) => gzip::encode(&decoded, configuration),
            #[cfg(not(feature = "gzip"))]
            Self::Gzip(_) => Err(CodecError::MissingFeature("gzip")),
            #[cfg(feature = "bz2")]
            Self::Bz2(configuration) => bz2::encode(&decoded, configuration),
            #[cfg(not(feature = "bz2"))]
            Self::Bz2(_) => Err(CodecError::MissingFeature("bz2")),
            #[cfg(feature = "blosc")]
            Self::Blosc(configuration) => blosc::encode(&decoded, configuration, element_size),
            #[cfg(not(feature = "blosc"))]
            Self::Blosc(_) => Err(CodecError::MissingFeature("blosc")),
        }
    }

    /// Decompress `encoded` bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] on a codec failure or if the required cargo
    /// feature is disabled.
    pub fn decode(&self, encoded: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Raw => Ok(encoded),
            #[cfg(feature = "gzip")]
            Self::Gzip(configuration) => gzip::decode(&encoded, configuration),
            #[cfg(not(feature = "gzip"))]
            Self::Gzip(_) => Err(CodecError::MissingFeature("gzip")),
            #[cfg(feature = "bz2")]
            Self::Bz2(_) => bz2::decode(&encoded),
            #[cfg(not(feature = "bz2"))]
            Self::Bz2(_) => Err(CodecError::MissingFeature("bz2")),
            #[cfg(feature = "blosc")]
            Self::Blosc(configuration) => blosc::decode(&encoded, configuration),
            #[cfg(not(feature = "blosc"))]
            Self::Blosc(_) => Err(CodecError::MissingFeature("blosc")),
        }
    }
}

impl serde::Serialize for Compressor {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_metadata().serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Compressor {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let metadata = CompressorMetadataV2::deserialize(d)?;
        Self::from_metadata(&metadata).map_err(serde::de::Error::custom)
    }
}

/// Configuration parameters for the gzip compressor family.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct GzipCompressorConfiguration {
    /// The compression level.
    pub level: GzipCompressionLevel,
    /// Use the zlib container format instead of the gzip container.
    ///
    /// Implied by the `id` discriminator (`zlib` rather than `gzip`), so it
    /// is never serialised as a parameter.
    #[serde(skip)]
    pub use_zlib_container: bool,
}

/// An invalid compression level error.
#[derive(Debug, Error)]
#[error("compression level {_0} is out of range for {_1}")]
pub struct CompressionLevelError(i64, &'static str);

/// A gzip/zlib compression level, an integer from 0 to 9.
#[derive(Serialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
pub struct GzipCompressionLevel(u32);

impl GzipCompressionLevel {
    /// The level as a `u32`.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for GzipCompressionLevel {
    type Error = CompressionLevelError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(CompressionLevelError(i64::from(level), "gzip"))
        }
    }
}

impl<'de> serde::Deserialize<'de> for GzipCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u32::deserialize(d)?;
        Self::try_from(level).map_err(serde::de::Error::custom)
    }
}

/// Configuration parameters for the `bz2` compressor.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct Bz2CompressorConfiguration {
    /// The compression level, equal to the bzip2 block size (1 to 9).
    pub level: Bz2CompressionLevel,
}

/// A bz2 compression level (block size), an integer from 1 to 9.
#[derive(Serialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
pub struct Bz2CompressionLevel(u32);

impl Bz2CompressionLevel {
    /// The level as a `u32`.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Bz2CompressionLevel {
    type Error = CompressionLevelError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if (1..=9).contains(&level) {
            Ok(Self(level))
        } else {
            Err(CompressionLevelError(i64::from(level), "bz2"))
        }
    }
}

impl<'de> serde::Deserialize<'de> for Bz2CompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u32::deserialize(d)?;
        Self::try_from(level).map_err(serde::de::Error::custom)
    }
}

/// Configuration parameters for the `blosc` compressor (numcodecs schema).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct BloscCompressorConfiguration {
    /// The internal compressor.
    pub cname: BloscCompressor,
    /// The compression level.
    pub clevel: BloscCompressionLevel,
    /// The shuffle mode.
    pub shuffle: BloscShuffleMode,
    /// The compression block size. Automatically determined if 0.
    #[serde(default)]
    pub blocksize: usize,
    /// Internal thread hint, passed through to the codec.
    #[serde(default = "blosc_nthreads_default")]
    pub nthreads: usize,
}

const fn blosc_nthreads_default() -> usize {
    1
}

/// A blosc compression level, an integer from 0 to 9.
#[derive(Serialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
pub struct BloscCompressionLevel(u32);

impl BloscCompressionLevel {
    /// The level as a `u32`.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for BloscCompressionLevel {
    type Error = CompressionLevelError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(CompressionLevelError(i64::from(level), "blosc"))
        }
    }
}

impl<'de> serde::Deserialize<'de> for BloscCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u32::deserialize(d)?;
        Self::try_from(level).map_err(serde::de::Error::custom)
    }
}

/// Blosc internal compressors.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
#[serde(rename_all = "lowercase")]
pub enum BloscCompressor {
    /// BloscLZ (the blosc default).
    BloscLZ,
    /// LZ4.
    LZ4,
    /// LZ4HC.
    LZ4HC,
    /// Snappy.
    Snappy,
    /// Zlib.
    Zlib,
    /// Zstd.
    Zstd,
}

impl BloscCompressor {
    /// The compressor name as a NUL-terminated C string for the blosc FFI.
    #[must_use]
    pub const fn as_cstr(self) -> &'static [u8] {
        match self {
            Self::BloscLZ => b"blosclz\0",
            Self::LZ4 => b"lz4\0",
            Self::LZ4HC => b"lz4hc\0",
            Self::Snappy => b"snappy\0",
            Self::Zlib => b"zlib\0",
            Self::Zstd => b"zstd\0",
        }
    }
}

/// Blosc shuffle modes (numcodecs integer encoding).
#[derive(Serialize_repr, Deserialize_repr, Copy, Clone, Eq, PartialEq, Debug, Display)]
#[repr(i8)]
pub enum BloscShuffleMode {
    /// No shuffling.
    NoShuffle = 0,
    /// Byte-wise shuffling.
    Shuffle = 1,
    /// Bit-wise shuffling.
    BitShuffle = 2,
    /// Bit-wise shuffling for single-byte elements, byte-wise otherwise.
    AutoShuffle = -1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressor_gzip_from_json() {
        let compressor: Compressor =
            serde_json::from_str(r#"{"id":"gzip","level":6}"#).unwrap();
        let Compressor::Gzip(configuration) = &compressor else {
            panic!("expected a gzip compressor")
        };
        assert_eq!(configuration.level.as_u32(), 6);
        assert!(!configuration.use_zlib_container);
        assert_eq!(compressor.id(), "gzip");
        let json = serde_json::to_value(&compressor).unwrap();
        assert_eq!(json["id"], "gzip");
        assert_eq!(json["level"], 6);
    }

    #[test]
    fn compressor_zlib_from_json() {
        let compressor: Compressor =
            serde_json::from_str(r#"{"id":"zlib","level":6}"#).unwrap();
        let Compressor::Gzip(configuration) = &compressor else {
            panic!("expected the gzip compressor family")
        };
        assert_eq!(configuration.level.as_u32(), 6);
        assert!(configuration.use_zlib_container);
        assert_eq!(compressor.id(), "zlib");
        // The discriminator survives a JSON round trip.
        let json = serde_json::to_string(&compressor).unwrap();
        let round_tripped: Compressor = serde_json::from_str(&json).unwrap();
        assert_eq!(round_tripped, compressor);
    }

    #[test]
    fn compressor_gzip_level_out_of_range() {
        assert!(serde_json::from_str::<Compressor>(r#"{"id":"gzip","level":10}"#).is_err());
    }

    #[test]
    fn compressor_blosc_from_json() {
        let compressor: Compressor = serde_json::from_str(
            r#"{"id":"blosc","cname":"lz4","clevel":5,"shuffle":1,"blocksize":0}"#,
        )
        .unwrap();
        let Compressor::Blosc(configuration) = &compressor else {
            panic!("expected a blosc compressor")
        };
        assert_eq!(configuration.cname, BloscCompressor::LZ4);
        assert_eq!(configuration.clevel.as_u32(), 5);
        assert_eq!(configuration.shuffle, BloscShuffleMode::Shuffle);
        assert_eq!(configuration.blocksize, 0);
        assert_eq!(configuration.nthreads, 1);
    }

    #[test]
    fn compressor_blosc_auto_shuffle() {
        let compressor: Compressor = serde_json::from_str(
            r#"{"id":"blosc","cname":"zstd","clevel":3,"shuffle":-1}"#,
        )
        .unwrap();
        let Compressor::Blosc(configuration) = &compressor else {
            panic!("expected a blosc compressor")
        };
        assert_eq!(configuration.shuffle, BloscShuffleMode::AutoShuffle);
    }

    #[test]
    fn compressor_bz2_from_json() {
        let compressor: Compressor =
            serde_json::from_str(r#"{"id":"bz2","level":9}"#).unwrap();
        assert!(matches!(compressor, Compressor::Bz2(_)));
        assert!(serde_json::from_str::<Compressor>(r#"{"id":"bz2","level":0}"#).is_err());
    }

    #[test]
    fn compressor_unknown_id() {
        let metadata: CompressorMetadataV2 =
            serde_json::from_str(r#"{"id":"lzma","preset":1}"#).unwrap();
        let err = Compressor::from_metadata(&metadata).unwrap_err();
        assert_eq!(err.id(), "lzma");
    }

    #[test]
    fn compressor_raw_round_trip() {
        let compressor: Compressor = serde_json::from_str(r#"{"id":"raw"}"#).unwrap();
        assert_eq!(compressor, Compressor::Raw);
        assert_eq!(
            serde_json::to_string(&compressor).unwrap(),
            r#"{"id":"raw"}"#
        );
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn compressor_gzip_encode_decode() {
        let compressor: Compressor =
            serde_json::from_str(r#"{"id":"gzip","level":1}"#).unwrap();
        let decoded: Vec<u8> = (0..255).collect();
        let encoded = compressor.encode(decoded.clone(), 1).unwrap();
        assert_eq!(compressor.decode(encoded).unwrap(), decoded);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn compressor_zlib_encode_decode() {
        let compressor: Compressor =
            serde_json::from_str(r#"{"id":"zlib","level":6}"#).unwrap();
        let decoded: Vec<u8> = (0..255).collect();
        let encoded = compressor.encode(decoded.clone(), 1).unwrap();
        // The zlib container differs from the gzip container.
        let gzip: Compressor = serde_json::from_str(r#"{"id":"gzip","level":6}"#).unwrap();
        assert!(gzip.decode(encoded.clone()).is_err());
        assert_eq!(compressor.decode(encoded).unwrap(), decoded);
    }

    #[cfg(feature = "bz2")]
    #[test]
    fn compressor_bz2_encode_decode() {
        let compressor: Compressor =
            serde_json::from_str(r#"{"id":"bz2","level":1}"#).unwrap();
        let decoded: Vec<u8> = (0..255).collect();
        let encoded = compressor.encode(decoded.clone(), 1).unwrap();
        assert_eq!(compressor.decode(encoded).unwrap(), decoded);
    }

    #[cfg(feature = "blosc")]
    #[test]
    fn compressor_blosc_encode_decode() {
        let compressor: Compressor = serde_json::from_str(
            r#"{"id":"blosc","cname":"lz4","clevel":5,"shuffle":2,"blocksize":0}"#,
        )
        .unwrap();
        let decoded: Vec<u8> = (0u16..256).flat_map(u16::to_ne_bytes).collect();
        let encoded = compressor.encode(decoded.clone(), 2).unwrap();
        assert_eq!(compressor.decode(encoded).unwrap(), decoded);
    }

    #[cfg(feature = "blosc")]
    #[test]
    fn compressor_blosc_multithreaded_hint() {
        let compressor: Compressor = serde_json::from_str(
            r#"{"id":"blosc","cname":"zstd","clevel":5,"shuffle":1,"blocksize":0,"nthreads":4}"#,
        )
        .unwrap();
        let Compressor::Blosc(configuration) = &compressor else {
            panic!("expected a blosc compressor")
        };
        assert_eq!(configuration.nthreads, 4);
        // The thread count is a hint; both directions honour it.
        let decoded: Vec<u8> = (0u16..256).flat_map(u16::to_ne_bytes).collect();
        let encoded = compressor.encode(decoded.clone(), 2).unwrap();
        assert_eq!(compressor.decode(encoded).unwrap(), decoded);
    }
}
