//! Chunk key construction for the Zarr V2 dialect.
//!
//! A chunk key joins the grid position indices with a separator, fastest
//! varying logical dimension first. The default separator is `.`, but an
//! array may declare `/` through the optional `dimension_separator` field
//! (OME-NGFF extension).

use derive_more::Display;
use serde::Deserialize;

/// A chunk key separator.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum ChunkKeySeparator {
    /// The slash '/' character.
    #[display("/")]
    Slash,
    /// The dot '.' character.
    #[display(".")]
    Dot,
}

impl Default for ChunkKeySeparator {
    /// The default separator for this dialect: `.`.
    fn default() -> Self {
        Self::Dot
    }
}

impl TryFrom<char> for ChunkKeySeparator {
    type Error = char;

    fn try_from(separator: char) -> Result<Self, Self::Error> {
        if separator == '/' {
            Ok(Self::Slash)
        } else if separator == '.' {
            Ok(Self::Dot)
        } else {
            Err(separator)
        }
    }
}

impl serde::Serialize for ChunkKeySeparator {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            ChunkKeySeparator::Slash => s.serialize_char('/'),
            ChunkKeySeparator::Dot => s.serialize_char('.'),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ChunkKeySeparator {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        if let serde_json::Value::String(separator) = value {
            if separator == "/" {
                return Ok(ChunkKeySeparator::Slash);
            } else if separator == "." {
                return Ok(ChunkKeySeparator::Dot);
            }
        }
        Err(serde::de::Error::custom(
            "chunk key separator must be a `.` or `/`.",
        ))
    }
}

/// Encode a chunk grid position into a storage-relative chunk key.
///
/// The on-disk key always lists indices from the fastest-varying logical
/// dimension first. For canonical row-major (`C` order) metadata the grid
/// position is therefore joined **reversed**; for an `F` order grid position
/// (the non-canonicalised view, where the first dimension already varies
/// fastest) it is joined in the given order. The reversal here compensates
/// for the shape/chunks reversal performed during metadata canonicalisation
/// and must happen in exactly one of the two places.
#[must_use]
pub fn chunk_key(
    grid_position: &[u64],
    separator: ChunkKeySeparator,
    row_major: bool,
) -> String {
    let separator = separator.to_string();
    if row_major {
        join_indices(grid_position.iter().rev(), &separator)
    } else {
        join_indices(grid_position.iter(), &separator)
    }
}

fn join_indices<'a>(
    indices: impl Iterator<Item = &'a u64>,
    separator: &str,
) -> String {
    indices
        .map(u64::to_string)
        .collect::<Vec<String>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_key_row_major_reverses() {
        assert_eq!(
            chunk_key(&[1, 2, 3], ChunkKeySeparator::Dot, true),
            "3.2.1"
        );
        assert_eq!(
            chunk_key(&[1, 2, 3], ChunkKeySeparator::Slash, true),
            "3/2/1"
        );
    }

    #[test]
    fn chunk_key_column_major_in_order() {
        assert_eq!(
            chunk_key(&[1, 2, 3], ChunkKeySeparator::Dot, false),
            "1.2.3"
        );
    }

    #[test]
    fn chunk_key_symmetric_position() {
        // The 1D and symmetric cases cannot distinguish the two branches.
        assert_eq!(chunk_key(&[1, 1], ChunkKeySeparator::Dot, true), "1.1");
        assert_eq!(chunk_key(&[1, 1], ChunkKeySeparator::Dot, false), "1.1");
        assert_eq!(chunk_key(&[7], ChunkKeySeparator::Dot, true), "7");
    }

    #[test]
    fn chunk_key_branches_agree_after_canonicalisation() {
        // (x, y, z) under F order, before canonicalisation ...
        let f_key = chunk_key(&[4, 5, 6], ChunkKeySeparator::Dot, false);
        // ... equals (z, y, x) under C order, after canonicalisation.
        let c_key = chunk_key(&[6, 5, 4], ChunkKeySeparator::Dot, true);
        assert_eq!(f_key, c_key);
    }

    #[test]
    fn chunk_key_separator_serde() {
        let separator: ChunkKeySeparator = serde_json::from_str(r#""/""#).unwrap();
        assert_eq!(separator, ChunkKeySeparator::Slash);
        assert_eq!(serde_json::to_string(&separator).unwrap(), r#""/""#);
        assert!(serde_json::from_str::<ChunkKeySeparator>(r#""-""#).is_err());
    }
}
