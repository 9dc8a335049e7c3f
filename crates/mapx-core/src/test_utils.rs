//! Fixture builders for archives and resource files.
//!
//! The resource encoders write the smallest files the extractors accept,
//! with a little geometry where the extractors have to skip over it.
//!
//! # Panics
//!
//! The archive helpers panic on I/O errors since they are meant for tests.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;

use encoding_rs::EUC_KR;

/// Creates an in-memory TAR archive from `(path, content)` entries.
///
/// # Examples
///
/// ```
/// use mapx_core::test_utils::create_test_tar;
///
/// let tar_data = create_test_tar(vec![
///     ("data/a.gnd", &b"gnd"[..]),
///     ("data/texture/b.bmp", &b"bmp"[..]),
/// ]);
/// assert!(!tar_data.is_empty());
/// ```
#[must_use]
pub fn create_test_tar(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    let mut ar = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        ar.append_data(&mut header, path, data).unwrap();
    }
    ar.into_inner().unwrap()
}

/// Creates an in-memory ZIP archive from `(path, content)` entries, stored
/// uncompressed.
///
/// # Examples
///
/// ```
/// use mapx_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(vec![("data/a.gnd", &b"gnd"[..])]);
/// assert_eq!(&zip_data[..2], b"PK");
/// ```
#[must_use]
pub fn create_test_zip(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    use zip::write::SimpleFileOptions;
    use zip::write::ZipWriter;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);

    for (path, data) in entries {
        zip.start_file(path, options).unwrap();
        zip.write_all(data).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

fn put_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_len(buf: &mut Vec<u8>, len: usize) {
    put_i32(buf, i32::try_from(len).unwrap());
}

fn put_zeros(buf: &mut Vec<u8>, len: usize) {
    buf.resize(buf.len() + len, 0);
}

fn euc_kr(name: &str) -> Vec<u8> {
    let (bytes, _, _) = EUC_KR.encode(name);
    bytes.into_owned()
}

fn put_fixed(buf: &mut Vec<u8>, name: &str, len: usize) {
    let mut bytes = euc_kr(name);
    assert!(bytes.len() < len, "{name} does not fit in {len} bytes");
    bytes.resize(len, 0);
    buf.extend_from_slice(&bytes);
}

fn put_prefixed(buf: &mut Vec<u8>, name: &str) {
    let bytes = euc_kr(name);
    put_len(buf, bytes.len());
    buf.extend_from_slice(&bytes);
}

/// Encodes a version 1.7 ground file with the given texture table.
#[must_use]
pub fn encode_gnd(textures: &[&str]) -> Vec<u8> {
    let mut buf = b"GRGN".to_vec();
    buf.extend_from_slice(&[1, 7]);
    put_u32(&mut buf, 2);
    put_u32(&mut buf, 2);
    buf.extend_from_slice(&10.0f32.to_le_bytes());
    put_u32(&mut buf, u32::try_from(textures.len()).unwrap());
    put_u32(&mut buf, 80);
    for texture in textures {
        put_fixed(&mut buf, texture, 80);
    }
    buf
}

/// Encodes an effect file with one texture list per layer.
#[must_use]
pub fn encode_str(layers: &[&[&str]]) -> Vec<u8> {
    let mut buf = b"STRM".to_vec();
    put_u32(&mut buf, 0x94);
    put_u32(&mut buf, 60);
    put_u32(&mut buf, 10);
    put_u32(&mut buf, u32::try_from(layers.len()).unwrap());
    put_zeros(&mut buf, 16);
    for textures in layers {
        put_len(&mut buf, textures.len());
        for texture in *textures {
            put_fixed(&mut buf, texture, 128);
        }
        put_i32(&mut buf, 1);
        put_zeros(&mut buf, 124);
    }
    buf
}

#[derive(Debug, Clone)]
enum MeshTextures {
    Indices(Vec<i32>),
    Names(Vec<String>),
}

/// Builder for model files.
///
/// Version 1.x and 2.2 meshes refer to the texture table by index; 2.3
/// meshes carry their own names.
#[derive(Debug, Clone)]
pub struct RsmFixture {
    major: u8,
    minor: u8,
    textures: Vec<String>,
    meshes: Vec<MeshTextures>,
}

impl RsmFixture {
    /// Starts a version 1.`minor` model.
    #[must_use]
    pub const fn v1(minor: u8) -> Self {
        Self {
            major: 1,
            minor,
            textures: Vec::new(),
            meshes: Vec::new(),
        }
    }

    /// Starts a version 2.`minor` model.
    #[must_use]
    pub const fn v2(minor: u8) -> Self {
        Self {
            major: 2,
            minor,
            textures: Vec::new(),
            meshes: Vec::new(),
        }
    }

    /// Adds an entry to the global texture table.
    #[must_use]
    pub fn texture(mut self, name: &str) -> Self {
        self.textures.push(name.to_string());
        self
    }

    /// Adds a mesh using table indices.
    #[must_use]
    pub fn mesh_indices(mut self, indices: &[i32]) -> Self {
        self.meshes.push(MeshTextures::Indices(indices.to_vec()));
        self
    }

    /// Adds a mesh listing its own texture names (version 2.3).
    #[must_use]
    pub fn mesh_names(mut self, names: &[&str]) -> Self {
        self.meshes.push(MeshTextures::Names(
            names.iter().map(ToString::to_string).collect(),
        ));
        self
    }

    /// Encodes the model.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = b"GRSM".to_vec();
        buf.extend_from_slice(&[self.major, self.minor]);
        put_i32(&mut buf, 0);
        put_i32(&mut buf, 1);
        if self.major == 1 {
            self.encode_v1(&mut buf);
        } else {
            self.encode_v2(&mut buf);
        }
        buf
    }

    fn at_least(&self, major: u8, minor: u8) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    fn encode_v1(&self, buf: &mut Vec<u8>) {
        if self.at_least(1, 4) {
            buf.push(0xff);
        }
        put_zeros(buf, 16);
        put_len(buf, self.textures.len());
        for texture in &self.textures {
            put_fixed(buf, texture, 40);
        }
        put_fixed(buf, "root", 40);

        put_len(buf, self.meshes.len());
        for (idx, mesh) in self.meshes.iter().enumerate() {
            put_fixed(buf, &format!("mesh{idx}"), 40);
            put_fixed(buf, if idx == 0 { "" } else { "mesh0" }, 40);
            let MeshTextures::Indices(indices) = mesh else {
                panic!("version 1 meshes use texture indices");
            };
            put_len(buf, indices.len());
            for &index in indices {
                put_i32(buf, index);
            }

            put_zeros(buf, 36 + 12 * 2 + 4 + 12 * 2);
            put_i32(buf, 1);
            put_zeros(buf, 12);
            put_i32(buf, 1);
            put_zeros(buf, if self.at_least(1, 2) { 12 } else { 8 });
            put_i32(buf, 1);
            put_zeros(buf, if self.at_least(1, 2) { 24 } else { 20 });
            if self.at_least(1, 5) {
                put_i32(buf, 1);
                put_zeros(buf, 16);
            }
            put_i32(buf, 1);
            put_zeros(buf, 20);
        }
    }

    fn encode_v2(&self, buf: &mut Vec<u8>) {
        buf.push(0xff);
        buf.extend_from_slice(&30.0f32.to_le_bytes());
        if !self.at_least(2, 3) {
            put_len(buf, self.textures.len());
            for texture in &self.textures {
                put_prefixed(buf, texture);
            }
        }
        put_i32(buf, 1);
        put_prefixed(buf, "root");

        put_len(buf, self.meshes.len());
        for (idx, mesh) in self.meshes.iter().enumerate() {
            put_prefixed(buf, &format!("mesh{idx}"));
            put_prefixed(buf, if idx == 0 { "" } else { "mesh0" });
            match mesh {
                MeshTextures::Indices(indices) => {
                    put_len(buf, indices.len());
                    for &index in indices {
                        put_i32(buf, index);
                    }
                }
                MeshTextures::Names(names) => {
                    put_len(buf, names.len());
                    for name in names {
                        put_prefixed(buf, name);
                    }
                }
            }

            put_zeros(buf, 36 + 12);
            put_i32(buf, 1);
            put_zeros(buf, 12);
            put_i32(buf, 1);
            put_zeros(buf, 12);
            put_i32(buf, 1);
            put_i32(buf, 24);
            put_zeros(buf, 24);

            // scale, rotation and position keys: frame, 4 floats
            for values in [[1.0f32, 1.0, 1.0, 1.0], [0.0, 0.0, 0.0, 1.0], [2.0, 3.0, 4.0, 1.0]] {
                put_i32(buf, 1);
                put_i32(buf, 0);
                for value in values {
                    buf.extend_from_slice(&value.to_le_bytes());
                }
            }

            if self.at_least(2, 3) {
                put_i32(buf, 1);
                put_i32(buf, 0);
                put_i32(buf, 1);
                put_i32(buf, 0);
                put_i32(buf, 1);
                put_i32(buf, 0);
                buf.extend_from_slice(&0.5f32.to_le_bytes());
            }
        }
    }
}

#[derive(Debug, Clone)]
enum WorldObject {
    Model(String),
    Light,
    Sound(String),
    Effect(i32),
}

/// Builder for world files.
#[derive(Debug, Clone)]
pub struct RswFixture {
    major: u8,
    minor: u8,
    build: i32,
    objects: Vec<WorldObject>,
}

impl RswFixture {
    /// Starts a world of version `major.minor`.
    #[must_use]
    pub const fn new(major: u8, minor: u8) -> Self {
        Self {
            major,
            minor,
            build: 187,
            objects: Vec::new(),
        }
    }

    /// Sets the build number written by 2.5+ worlds.
    #[must_use]
    pub fn build(mut self, build: i32) -> Self {
        self.build = build;
        self
    }

    /// Places a model.
    #[must_use]
    pub fn model(mut self, file: &str) -> Self {
        self.objects.push(WorldObject::Model(file.to_string()));
        self
    }

    /// Places a light.
    #[must_use]
    pub fn light(mut self) -> Self {
        self.objects.push(WorldObject::Light);
        self
    }

    /// Places a sound.
    #[must_use]
    pub fn sound(mut self, file: &str) -> Self {
        self.objects.push(WorldObject::Sound(file.to_string()));
        self
    }

    /// Places an effect.
    #[must_use]
    pub fn effect(mut self, id: i32) -> Self {
        self.objects.push(WorldObject::Effect(id));
        self
    }

    fn at_least(&self, major: u8, minor: u8) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// Encodes the world.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = b"GRSW".to_vec();
        buf.extend_from_slice(&[self.major, self.minor]);

        if self.at_least(2, 5) {
            put_i32(&mut buf, self.build);
            buf.push(0);
        } else if self.at_least(2, 2) {
            buf.push(0);
        }

        put_fixed(&mut buf, "map.ini", 40);
        put_fixed(&mut buf, "map.gnd", 40);
        put_fixed(&mut buf, "map.gat", 40);
        if self.at_least(1, 4) {
            put_fixed(&mut buf, "map.src", 40);
        }

        if !self.at_least(2, 6) {
            if self.at_least(1, 3) {
                put_zeros(&mut buf, 4);
            }
            if self.at_least(1, 8) {
                put_zeros(&mut buf, 16);
            }
            if self.at_least(1, 9) {
                put_zeros(&mut buf, 4);
            }
        }
        if self.at_least(1, 5) {
            put_zeros(&mut buf, 8 + 24);
            if self.at_least(1, 7) {
                put_zeros(&mut buf, 4);
            }
        }
        if self.at_least(1, 6) {
            put_zeros(&mut buf, 16);
        }

        put_len(&mut buf, self.objects.len());
        for (idx, object) in self.objects.iter().enumerate() {
            match object {
                WorldObject::Model(file) => {
                    put_i32(&mut buf, 1);
                    if self.at_least(1, 3) {
                        put_fixed(&mut buf, &format!("model{idx}"), 40);
                        put_zeros(&mut buf, 12);
                    }
                    if self.at_least(2, 6) && self.build >= 186 {
                        buf.push(0);
                    }
                    put_fixed(&mut buf, file, 80);
                    put_fixed(&mut buf, "", 80);
                    put_zeros(&mut buf, 36);
                }
                WorldObject::Light => {
                    put_i32(&mut buf, 2);
                    put_fixed(&mut buf, &format!("light{idx}"), 80);
                    put_zeros(&mut buf, 28);
                }
                WorldObject::Sound(file) => {
                    put_i32(&mut buf, 3);
                    put_fixed(&mut buf, &format!("sound{idx}"), 80);
                    put_fixed(&mut buf, file, 80);
                    put_zeros(&mut buf, 28);
                    if self.at_least(2, 0) {
                        put_zeros(&mut buf, 4);
                    }
                }
                WorldObject::Effect(id) => {
                    put_i32(&mut buf, 4);
                    put_fixed(&mut buf, &format!("effect{idx}"), 80);
                    put_zeros(&mut buf, 12);
                    put_i32(&mut buf, *id);
                    put_zeros(&mut buf, 20);
                }
            }
        }
        buf
    }
}
