//! The gzip compressor family, backed by `flate2`.
//!
//! The `gzip` and `zlib` numcodecs ids share the DEFLATE stream and compression
//! level semantics and differ only in the container framing.

use std::io::{Cursor, Read};

use flate2::bufread::{GzDecoder, GzEncoder};
use flate2::read::{ZlibDecoder, ZlibEncoder};

use super::{CodecError, GzipCompressorConfiguration};

pub(super) fn encode(
    decoded: &[u8],
    configuration: &GzipCompressorConfiguration,
) -> Result<Vec<u8>, CodecError> {
    let compression = flate2::Compression::new(configuration.level.as_u32());
    let mut out: Vec<u8> = Vec::new();
    if configuration.use_zlib_container {
        let mut encoder = ZlibEncoder::new(Cursor::new(decoded), compression);
        encoder.read_to_end(&mut out)?;
    } else {
        let mut encoder = GzEncoder::new(Cursor::new(decoded), compression);
        encoder.read_to_end(&mut out)?;
    }
    Ok(out)
}

pub(super) fn decode(
    encoded: &[u8],
    configuration: &GzipCompressorConfiguration,
) -> Result<Vec<u8>, CodecError> {
    let mut out: Vec<u8> = Vec::new();
    if configuration.use_zlib_container {
        let mut decoder = ZlibDecoder::new(Cursor::new(encoded));
        decoder.read_to_end(&mut out)?;
    } else {
        let mut decoder = GzDecoder::new(Cursor::new(encoded));
        decoder.read_to_end(&mut out)?;
    }
    Ok(out)
}
