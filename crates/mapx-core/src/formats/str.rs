//! Effect (`.str`) layer textures.

use super::ReferenceExtractor;
use super::ResourceKind;
use super::reader::ByteReader;
use crate::error::ParseError;

const MAGIC: &str = "STRM";
const VERSION: u32 = 0x94;
const TEXTURE_NAME_LEN: usize = 128;
const KEY_FRAME_LEN: usize = 124;

/// Extracts the textures of every animation layer of an effect.
///
/// Names are relative to the directory holding the effect. Layers may share
/// textures, so the result can contain duplicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrExtractor;

impl ReferenceExtractor for StrExtractor {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Effect
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<String>, ParseError> {
        let mut reader = ByteReader::new(bytes);
        reader.magic(MAGIC)?;

        let version = reader.u32()?;
        if version != VERSION {
            let [minor, major, ..] = version.to_le_bytes();
            return Err(ParseError::UnsupportedVersion {
                format: "STR",
                major,
                minor,
            });
        }

        let _fps = reader.u32()?;
        let _max_key = reader.u32()?;
        let layers = reader.u32()?;
        reader.skip(16)?;

        let mut names = Vec::new();
        for _ in 0..layers {
            let textures = reader.count(TEXTURE_NAME_LEN)?;
            for _ in 0..textures {
                let name = reader.fixed_string(TEXTURE_NAME_LEN)?;
                if !name.is_empty() {
                    names.push(name);
                }
            }
            let keys = reader.count(KEY_FRAME_LEN)?;
            reader.skip(keys * KEY_FRAME_LEN)?;
        }
        Ok(names)
    }
}
