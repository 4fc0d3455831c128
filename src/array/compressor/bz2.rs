//! The `bz2` compressor, backed by `bzip2`.

use std::io::{Cursor, Read};

use super::{Bz2CompressorConfiguration, CodecError};

pub(super) fn encode(
    decoded: &[u8],
    configuration: &Bz2CompressorConfiguration,
) -> Result<Vec<u8>, CodecError> {
    let compression = bzip2::Compression::new(configuration.level.as_u32());
    let mut encoder = bzip2::read::BzEncoder::new(Cursor::new(decoded), compression);
    let mut out: Vec<u8> = Vec::new();
    encoder.read_to_end(&mut out)?;
    Ok(out)
}

pub(super) fn decode(encoded: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = bzip2::read::BzDecoder::new(Cursor::new(encoded));
    let mut out: Vec<u8> = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
