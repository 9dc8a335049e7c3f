//! Ground (`.gnd`) texture table.

use super::ReferenceExtractor;
use super::ResourceKind;
use super::dedup_names;
use super::reader::ByteReader;
use crate::error::ParseError;

const MAGIC: &str = "GRGN";

/// Extracts the terrain texture table of a ground file.
///
/// Layout: signature, version (major, minor), width and height in tiles,
/// zoom, texture count, texture name length, then the names.
#[derive(Debug, Clone, Copy, Default)]
pub struct GndExtractor;

impl ReferenceExtractor for GndExtractor {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Ground
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<String>, ParseError> {
        let mut reader = ByteReader::new(bytes);
        reader.magic(MAGIC)?;

        let major = reader.u8()?;
        let minor = reader.u8()?;
        if major != 1 || !(5..=9).contains(&minor) {
            return Err(ParseError::UnsupportedVersion {
                format: "GND",
                major,
                minor,
            });
        }

        let _width = reader.u32()?;
        let _height = reader.u32()?;
        let _zoom = reader.f32()?;

        let count = reader.count(0)?;
        let name_len = usize::try_from(reader.u32()?)
            .map_err(|_| ParseError::InvalidData("texture name length".into()))?;
        if count.saturating_mul(name_len) > reader.remaining() {
            return Err(ParseError::Truncated {
                offset: reader.position(),
                needed: count.saturating_mul(name_len) - reader.remaining(),
            });
        }

        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            let name = reader.fixed_string(name_len)?;
            if !name.is_empty() {
                names.push(name);
            }
        }
        Ok(dedup_names(names))
    }
}
