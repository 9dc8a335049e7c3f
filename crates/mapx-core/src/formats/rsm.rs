//! Model (`.rsm`, `.rsm2`) texture references.
//!
//! Version 1.x models declare a global texture table of 40-byte names and
//! meshes refer to it by index. Version 2.2 keeps the table but stores
//! length-prefixed names; version 2.3 drops the table and lists texture
//! names per mesh. Mesh geometry and key frames are skipped, they only
//! have to be walked past to reach the next mesh. Version 2.x meshes end
//! with scale, rotation and position keys, and from 2.3 on a texture
//! animation list.

use super::ReferenceExtractor;
use super::ResourceKind;
use super::dedup_names;
use super::reader::ByteReader;
use super::reader::ParseResult;
use crate::error::ParseError;

const MAGIC: &str = "GRSM";
const NAME_LEN: usize = 40;

const MATRIX_LEN: usize = 9 * 4;
const VEC3_LEN: usize = 3 * 4;
const POS_KEY_LEN: usize = 4 + VEC3_LEN;
const ROT_KEY_LEN: usize = 4 + 4 * 4;
const SCALE_KEY_LEN: usize = 4 + VEC3_LEN + 4;
const POS_KEY_V2_LEN: usize = 4 + VEC3_LEN + 4;
const TEX_KEY_LEN: usize = 4 + 4;

/// Extracts texture names from a model.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsmExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Version {
    major: u8,
    minor: u8,
}

impl Version {
    const fn at_least(self, major: u8, minor: u8) -> bool {
        self.major > major || (self.major == major && self.minor >= minor)
    }
}

impl ReferenceExtractor for RsmExtractor {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Model
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<String>, ParseError> {
        let mut reader = ByteReader::new(bytes);
        reader.magic(MAGIC)?;

        let version = Version {
            major: reader.u8()?,
            minor: reader.u8()?,
        };
        match (version.major, version.minor) {
            (1, 1..=5) => extract_v1(&mut reader, version),
            (2, 2..=3) => extract_v2(&mut reader, version),
            (major, minor) => Err(ParseError::UnsupportedVersion {
                format: "RSM",
                major,
                minor,
            }),
        }
    }
}

fn extract_v1(reader: &mut ByteReader<'_>, version: Version) -> ParseResult<Vec<String>> {
    let _anim_len = reader.i32()?;
    let _shade_type = reader.i32()?;
    if version.at_least(1, 4) {
        let _alpha = reader.u8()?;
    }
    reader.skip(16)?;

    let table = read_fixed_names(reader)?;
    let _main_node = reader.fixed_string(NAME_LEN)?;

    let mesh_count = reader.count(NAME_LEN * 2)?;
    let mut names = Vec::new();
    for _ in 0..mesh_count {
        let _name = reader.fixed_string(NAME_LEN)?;
        let _parent = reader.fixed_string(NAME_LEN)?;
        collect_indexed(reader, &table, &mut names)?;
        skip_mesh_body_v1(reader, version)?;
    }

    names.extend(table);
    Ok(dedup_names(names))
}

fn extract_v2(reader: &mut ByteReader<'_>, version: Version) -> ParseResult<Vec<String>> {
    let _anim_len = reader.i32()?;
    let _shade_type = reader.i32()?;
    let _alpha = reader.u8()?;
    let _fps = reader.f32()?;

    let table = if version.at_least(2, 3) {
        Vec::new()
    } else {
        read_prefixed_names(reader)?
    };

    let root_count = reader.count(4)?;
    for _ in 0..root_count {
        let _root = reader.prefixed_string()?;
    }

    let mesh_count = reader.count(8)?;
    let mut names = Vec::new();
    for _ in 0..mesh_count {
        let _name = reader.prefixed_string()?;
        let _parent = reader.prefixed_string()?;
        if version.at_least(2, 3) {
            names.extend(read_prefixed_names(reader)?);
        } else {
            collect_indexed(reader, &table, &mut names)?;
        }
        skip_mesh_body_v2(reader, version)?;
    }

    names.extend(table);
    Ok(dedup_names(names))
}

fn read_fixed_names(reader: &mut ByteReader<'_>) -> ParseResult<Vec<String>> {
    let count = reader.count(NAME_LEN)?;
    (0..count).map(|_| reader.fixed_string(NAME_LEN)).collect()
}

fn read_prefixed_names(reader: &mut ByteReader<'_>) -> ParseResult<Vec<String>> {
    let count = reader.count(4)?;
    (0..count).map(|_| reader.prefixed_string()).collect()
}

/// Reads a mesh's texture indices and appends the names they point at.
/// Indices outside the table are ignored.
fn collect_indexed(
    reader: &mut ByteReader<'_>,
    table: &[String],
    names: &mut Vec<String>,
) -> ParseResult<()> {
    let count = reader.count(4)?;
    for _ in 0..count {
        let index = reader.i32()?;
        match usize::try_from(index).ok().and_then(|i| table.get(i)) {
            Some(name) => names.push(name.clone()),
            None => tracing::trace!(index, "texture index outside table"),
        }
    }
    Ok(())
}

fn skip_records(reader: &mut ByteReader<'_>, record_len: usize) -> ParseResult<()> {
    let count = reader.count(record_len)?;
    reader.skip(count * record_len)
}

fn skip_mesh_body_v1(reader: &mut ByteReader<'_>, version: Version) -> ParseResult<()> {
    // offset matrix, pos_, pos, rotation angle and axis, scale
    reader.skip(MATRIX_LEN + VEC3_LEN * 2 + 4 + VEC3_LEN * 2)?;

    skip_records(reader, VEC3_LEN)?;
    skip_records(reader, if version.at_least(1, 2) { 12 } else { 8 })?;
    skip_records(reader, if version.at_least(1, 2) { 24 } else { 20 })?;

    if version.at_least(1, 5) {
        skip_records(reader, POS_KEY_LEN)?;
    }
    skip_records(reader, ROT_KEY_LEN)
}

fn skip_mesh_body_v2(reader: &mut ByteReader<'_>, version: Version) -> ParseResult<()> {
    reader.skip(MATRIX_LEN + VEC3_LEN)?;

    skip_records(reader, VEC3_LEN)?;
    skip_records(reader, 12)?;

    let faces = reader.count(4)?;
    for _ in 0..faces {
        let len = reader.count(1)?;
        reader.skip(len)?;
    }

    skip_records(reader, SCALE_KEY_LEN)?;
    skip_records(reader, ROT_KEY_LEN)?;
    skip_records(reader, POS_KEY_V2_LEN)?;

    if !version.at_least(2, 3) {
        return Ok(());
    }
    let animated_textures = reader.count(8)?;
    for _ in 0..animated_textures {
        let _texture = reader.i32()?;
        let animations = reader.count(8)?;
        for _ in 0..animations {
            let _kind = reader.i32()?;
            skip_records(reader, TEX_KEY_LEN)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::RsmFixture;

    #[test]
    fn test_v1_union_of_meshes_and_table() {
        let bytes = RsmFixture::v1(4)
            .texture("wall.bmp")
            .texture("roof.bmp")
            .texture("unused.bmp")
            .mesh_indices(&[1])
            .mesh_indices(&[0, 1])
            .encode();

        let names = RsmExtractor.extract(&bytes).unwrap();
        assert_eq!(names, ["roof.bmp", "wall.bmp", "unused.bmp"]);
    }

    #[test]
    fn test_each_v1_minor_version() {
        for minor in 1..=5 {
            let bytes = RsmFixture::v1(minor)
                .texture("a.bmp")
                .mesh_indices(&[0])
                .mesh_indices(&[0])
                .encode();
            assert_eq!(RsmExtractor.extract(&bytes).unwrap(), ["a.bmp"], "1.{minor}");
        }
    }

    #[test]
    fn test_v2_2_indexed_table() {
        let bytes = RsmFixture::v2(2)
            .texture("body.tga")
            .texture("Body.TGA")
            .texture("eye.tga")
            .mesh_indices(&[2])
            .encode();

        let names = RsmExtractor.extract(&bytes).unwrap();
        assert_eq!(names, ["eye.tga", "body.tga"]);
    }

    #[test]
    fn test_v2_3_per_mesh_names() {
        let bytes = RsmFixture::v2(3)
            .mesh_names(&["tree\\bark.bmp", "tree\\leaf.tga"])
            .mesh_names(&["tree\\leaf.tga", "tree\\moss.bmp"])
            .encode();

        let names = RsmExtractor.extract(&bytes).unwrap();
        assert_eq!(names, ["tree\\bark.bmp", "tree\\leaf.tga", "tree\\moss.bmp"]);
    }

    #[test]
    fn test_v2_animated_meshes_stay_aligned() {
        let bytes = RsmFixture::v2(2)
            .texture("a.bmp")
            .texture("b.bmp")
            .mesh_indices(&[0])
            .mesh_indices(&[1])
            .encode();
        assert_eq!(RsmExtractor.extract(&bytes).unwrap(), ["a.bmp", "b.bmp"]);

        let bytes = RsmFixture::v2(3)
            .mesh_names(&["a.bmp"])
            .mesh_names(&["b.bmp"])
            .encode();
        assert_eq!(RsmExtractor.extract(&bytes).unwrap(), ["a.bmp", "b.bmp"]);
    }

    fn key(buf: &mut Vec<u8>, frame: i32, values: [f32; 4]) {
        buf.extend_from_slice(&frame.to_le_bytes());
        for value in values {
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }

    #[test]
    fn test_v2_mesh_tail_key_order() {
        let mut body = vec![0u8; MATRIX_LEN + VEC3_LEN];
        for count in [0i32, 0, 0] {
            // vertices, texture vertices, faces
            body.extend_from_slice(&count.to_le_bytes());
        }
        // two scale keys
        body.extend_from_slice(&2i32.to_le_bytes());
        key(&mut body, 0, [1.0, 1.0, 1.0, 1.0]);
        key(&mut body, 10, [2.0, 2.0, 2.0, 1.0]);
        // one rotation key
        body.extend_from_slice(&1i32.to_le_bytes());
        key(&mut body, 0, [0.0, 0.0, 0.0, 1.0]);
        // one position key
        body.extend_from_slice(&1i32.to_le_bytes());
        key(&mut body, 0, [5.0, 6.0, 7.0, 1.0]);
        body.extend_from_slice(b"tail");

        let mut reader = ByteReader::new(&body);
        let v2_2 = Version { major: 2, minor: 2 };
        skip_mesh_body_v2(&mut reader, v2_2).unwrap();
        assert_eq!(reader.position(), body.len() - 4);

        // 2.3 adds the texture animation list
        body.truncate(body.len() - 4);
        body.extend_from_slice(&0i32.to_le_bytes());
        let mut reader = ByteReader::new(&body);
        let v2_3 = Version { major: 2, minor: 3 };
        skip_mesh_body_v2(&mut reader, v2_3).unwrap();
        assert_eq!(reader.position(), body.len());
    }

    #[test]
    fn test_out_of_range_index_ignored() {
        let bytes = RsmFixture::v1(4).texture("a.bmp").mesh_indices(&[7, -1]).encode();
        assert_eq!(RsmExtractor.extract(&bytes).unwrap(), ["a.bmp"]);
    }

    #[test]
    fn test_rejects_unsupported_version() {
        let mut bytes = RsmFixture::v1(4).encode();
        bytes[4] = 3;
        assert!(matches!(
            RsmExtractor.extract(&bytes),
            Err(ParseError::UnsupportedVersion { major: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_truncated_mesh() {
        let bytes = RsmFixture::v1(5).texture("a.bmp").mesh_indices(&[0]).encode();
        assert!(RsmExtractor.extract(&bytes[..bytes.len() - 3]).is_err());
    }
}
