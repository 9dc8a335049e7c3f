//! World (`.rsw`) model placements.

use super::ReferenceExtractor;
use super::ResourceKind;
use super::dedup_names;
use super::reader::ByteReader;
use super::reader::ParseResult;
use crate::error::ParseError;

const MAGIC: &str = "GRSW";
const VEC3_LEN: usize = 3 * 4;

const OBJECT_MODEL: i32 = 1;
const OBJECT_LIGHT: i32 = 2;
const OBJECT_SOUND: i32 = 3;
const OBJECT_EFFECT: i32 = 4;

/// Extracts the model files placed in a world.
///
/// Lights, sounds and effects are skipped. The result holds each model
/// file once, in order of first placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct RswExtractor;

impl ReferenceExtractor for RswExtractor {
    fn kind(&self) -> ResourceKind {
        ResourceKind::World
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<String>, ParseError> {
        let mut reader = ByteReader::new(bytes);
        reader.magic(MAGIC)?;

        let major = reader.u8()?;
        let minor = reader.u8()?;
        let supported = match major {
            1 => (2..=9).contains(&minor),
            2 => minor <= 6,
            _ => false,
        };
        if !supported {
            return Err(ParseError::UnsupportedVersion {
                format: "RSW",
                major,
                minor,
            });
        }
        let at_least = |ma: u8, mi: u8| major > ma || (major == ma && minor >= mi);

        let build = if at_least(2, 5) {
            let build = reader.i32()?;
            let _flag = reader.u8()?;
            build
        } else if at_least(2, 2) {
            i32::from(reader.u8()?)
        } else {
            0
        };
        let layout = ModelLayout {
            named: at_least(1, 3),
            flag_byte: at_least(2, 6) && build >= 186,
        };

        let _ini = reader.fixed_string(40)?;
        let _gnd = reader.fixed_string(40)?;
        let _gat = reader.fixed_string(40)?;
        if at_least(1, 4) {
            let _src = reader.fixed_string(40)?;
        }

        if !at_least(2, 6) {
            if at_least(1, 3) {
                let _level = reader.f32()?;
            }
            if at_least(1, 8) {
                // type, wave height, speed, pitch
                reader.skip(16)?;
            }
            if at_least(1, 9) {
                let _anim_speed = reader.i32()?;
            }
        }

        if at_least(1, 5) {
            // longitude, latitude, diffuse, ambient
            reader.skip(8 + VEC3_LEN * 2)?;
            if at_least(1, 7) {
                let _opacity = reader.f32()?;
            }
        }

        if at_least(1, 6) {
            // top, bottom, left, right
            reader.skip(16)?;
        }

        let count = reader.count(4)?;
        let mut models = Vec::new();
        for _ in 0..count {
            let offset = reader.position();
            match reader.i32()? {
                OBJECT_MODEL => models.push(read_model(&mut reader, layout)?),
                OBJECT_LIGHT => reader.skip(80 + VEC3_LEN * 2 + 4)?,
                OBJECT_SOUND => {
                    reader.skip(80 + 80 + VEC3_LEN + 4 + 4 + 4 + 4)?;
                    if at_least(2, 0) {
                        let _cycle = reader.f32()?;
                    }
                }
                OBJECT_EFFECT => reader.skip(80 + VEC3_LEN + 4 + 4 + 16)?,
                other => {
                    return Err(ParseError::InvalidData(format!(
                        "unknown object type {other} at offset {offset}"
                    )));
                }
            }
        }

        Ok(dedup_names(models.into_iter().filter(|m| !m.is_empty()).collect()))
    }
}

/// Version-dependent fields of a model object.
#[derive(Debug, Clone, Copy)]
struct ModelLayout {
    /// Name, animation and block fields precede the file (1.3+).
    named: bool,
    /// One extra byte follows the block type (2.6, build 186+).
    flag_byte: bool,
}

fn read_model(reader: &mut ByteReader<'_>, layout: ModelLayout) -> ParseResult<String> {
    if layout.named {
        let _name = reader.fixed_string(40)?;
        // animation type, animation speed, block type
        reader.skip(12)?;
    }
    if layout.flag_byte {
        let _flag = reader.u8()?;
    }
    let file = reader.fixed_string(80)?;
    let _node = reader.fixed_string(80)?;
    // position, rotation, scale
    reader.skip(VEC3_LEN * 3)?;
    Ok(file)
}
