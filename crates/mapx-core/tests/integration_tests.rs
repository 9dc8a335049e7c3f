//! Integration tests for mapx-core.
//!
//! These tests run complete walk, selection and export workflows against
//! in-memory sources and real archives on disk.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use mapx_core::CancellationToken;
use mapx_core::CheckState;
use mapx_core::DependencyTree;
use mapx_core::Document;
use mapx_core::ExtractorSet;
use mapx_core::Generation;
use mapx_core::LayeredResolver;
use mapx_core::MapError;
use mapx_core::NoopProgress;
use mapx_core::ResolverBuilder;
use mapx_core::WalkConfig;
use mapx_core::WalkSummary;
use mapx_core::Walker;
use mapx_core::config::PRIMARY_MARKER;
use mapx_core::export::DirectorySink;
use mapx_core::export::Exporter;
use mapx_core::export::StreamSink;
use mapx_core::path::NormalizedPath;
use mapx_core::source::ArchiveSource;
use mapx_core::source::MemorySource;
use mapx_core::source::open_source;
use mapx_core::test_utils::RsmFixture;
use mapx_core::test_utils::RswFixture;
use mapx_core::test_utils::create_test_tar;
use mapx_core::test_utils::create_test_zip;
use mapx_core::test_utils::encode_gnd;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use tempfile::TempDir;

fn resolver_over(source: MemorySource) -> LayeredResolver {
    ResolverBuilder::new(Generation(0))
        .source(Arc::new(source))
        .build()
}

fn walk(resolver: &LayeredResolver, name: &str, dir: &str) -> DependencyTree {
    let extractors = ExtractorSet::default();
    let config = WalkConfig::default();
    Walker::new(resolver, &extractors, &config)
        .walk(name, dir, true, &|| false)
        .tree
}

fn shared_texture_world() -> MemorySource {
    MemorySource::new("base")
        .with_file(
            "data\\w.rsw",
            RswFixture::new(2, 1).model("a.rsm").light().model("b.rsm").encode(),
        )
        .with_file(
            "data\\model\\a.rsm",
            RsmFixture::v1(4).texture("shared.bmp").texture("a_own.bmp").encode(),
        )
        .with_file(
            "data\\model\\b.rsm",
            RsmFixture::v1(4).texture("shared.bmp").texture("b_own.bmp").encode(),
        )
        .with_file("data\\texture\\shared.bmp", b"shared".to_vec())
        .with_file("data\\texture\\a_own.bmp", b"a".to_vec())
        .with_file("data\\texture\\b_own.bmp", b"b".to_vec())
}

fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap();
            let key = NormalizedPath::new(&relative.to_string_lossy()).as_str().to_string();
            (key, fs::read(entry.path()).unwrap())
        })
        .collect()
}

#[test]
fn test_ground_root_with_three_textures() {
    let resolver = resolver_over(
        MemorySource::new("base")
            .with_file("data\\town.gnd", encode_gnd(&["t1.bmp", "t2.bmp", "t3.bmp"]))
            .with_file("data\\texture\\t1.bmp", b"1".to_vec())
            .with_file("data\\texture\\t2.bmp", b"2".to_vec())
            .with_file("data\\texture\\t3.bmp", b"3".to_vec()),
    );
    let tree = walk(&resolver, "town.gnd", "data\\");

    assert_eq!(tree.roots().len(), 1);
    let root = tree.roots()[0];
    assert_eq!(tree.children(root).len(), 3);
    assert_eq!(tree.len(), 4);
    for (_, node) in tree.iter_depth_first() {
        assert!(node.enabled());
        assert_eq!(node.state, CheckState::Checked);
    }
}

#[test]
fn test_missing_texture_is_disabled_leaf() {
    let resolver = resolver_over(
        MemorySource::new("base")
            .with_file("data\\model\\house.rsm", RsmFixture::v1(4).texture("wall.bmp").encode()),
    );
    let mut tree = walk(&resolver, "house.rsm", "data\\model\\");

    let root = tree.roots()[0];
    let wall = tree.children(root)[0];
    assert!(!tree.node(wall).unwrap().enabled());
    assert!(!tree.node(wall).unwrap().has_children());

    // Disabled children do not count, so the root keeps its own state.
    assert!(!tree.set_checked(wall, false));
    assert!(!tree.propagate_up(root));
    assert_eq!(tree.state(root), Some(CheckState::Checked));

    let selection = tree.selection();
    assert_eq!(selection.len(), 1);
    assert!(selection.contains_path("data\\model\\house.rsm"));
    assert!(!selection.contains_path("data\\texture\\wall.bmp"));
}

#[test]
fn test_unchecking_shared_texture_affects_both_models() {
    let resolver = resolver_over(shared_texture_world());
    let mut tree = walk(&resolver, "w.rsw", "data\\");
    let root = tree.roots()[0];
    let models = tree.children(root).to_vec();
    assert_eq!(models.len(), 2);

    assert_eq!(tree.set_checked_path("DATA/texture/Shared.bmp", false), 2);
    for &model in &models {
        assert_eq!(tree.state(model), Some(CheckState::Indeterminate));
    }
    assert_eq!(tree.state(root), Some(CheckState::Indeterminate));
    assert!(!tree.selection().contains_path("data\\texture\\shared.bmp"));

    assert_eq!(tree.set_checked_path("data\\texture\\shared.bmp", true), 2);
    for &model in &models {
        assert_eq!(tree.state(model), Some(CheckState::Checked));
    }
    assert_eq!(tree.state(root), Some(CheckState::Checked));
    assert!(tree.selection().contains_path("data\\texture\\shared.bmp"));
}

#[test]
fn test_cancelled_walk_keeps_complete_nodes() {
    let textures: Vec<String> = (0..9).map(|i| format!("t{i}.bmp")).collect();
    let names: Vec<&str> = textures.iter().map(String::as_str).collect();
    let mut source = MemorySource::new("base").with_file("data\\town.gnd", encode_gnd(&names));
    for name in &names {
        source.insert(&format!("data\\texture\\{name}"), b"bmp".to_vec());
    }
    let resolver = resolver_over(source);
    let extractors = ExtractorSet::default();
    let config = WalkConfig::default();

    // Polls: root, then (before descent, child) pairs. The fourth poll
    // guards the descent into the second texture.
    let polls = Cell::new(0);
    let cancel = || {
        polls.set(polls.get() + 1);
        polls.get() > 3
    };
    let outcome = Walker::new(&resolver, &extractors, &config).walk("town.gnd", "data\\", true, &cancel);

    assert!(outcome.cancelled);
    let tree = outcome.tree;
    assert_eq!(tree.len(), 2);
    let root = tree.roots()[0];
    assert_eq!(tree.children(root).len(), 1);
    let child = tree.node(tree.children(root)[0]).unwrap();
    assert_eq!(child.relative_path, "data\\texture\\t0.bmp");
    assert_eq!(child.parent, Some(root));
}

#[test]
fn test_walk_is_deterministic() {
    let resolver = resolver_over(shared_texture_world());
    assert_eq!(walk(&resolver, "w.rsw", "data\\"), walk(&resolver, "w.rsw", "data\\"));
}

#[test]
fn test_export_is_deterministic_and_writes_shared_file_once() {
    let resolver = resolver_over(shared_texture_world());
    let tree = walk(&resolver, "w.rsw", "data\\");

    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let report = Exporter::new(&resolver)
        .export(&tree, &mut DirectorySink::new(first.path()), &mut NoopProgress)
        .unwrap();
    Exporter::new(&resolver)
        .export(&tree, &mut DirectorySink::new(second.path()), &mut NoopProgress)
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.files_written, 6);
    assert_eq!(report.duplicates_skipped, 1);
    let written = read_tree(first.path());
    assert_eq!(written.len(), 6);
    assert_eq!(written, read_tree(second.path()));
    assert_eq!(written["data/texture/shared.bmp"], b"shared");
}

#[derive(Clone, Default)]
struct Collected(Arc<Mutex<BTreeMap<String, Vec<u8>>>>);

struct EntryWriter {
    key: String,
    target: Collected,
}

impl Write for EntryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut files = self.target.0.lock().unwrap();
        files.entry(self.key.clone()).or_default().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_stream_sink_matches_directory_sink() {
    let resolver = resolver_over(shared_texture_world());
    let tree = walk(&resolver, "w.rsw", "data\\");

    let temp = TempDir::new().unwrap();
    Exporter::new(&resolver)
        .export(&tree, &mut DirectorySink::new(temp.path()), &mut NoopProgress)
        .unwrap();

    let collected = Collected::default();
    let target = collected.clone();
    let mut sink = StreamSink::new(move |path| {
        Ok(Box::new(EntryWriter {
            key: path.normalized().as_str().to_string(),
            target: target.clone(),
        }))
    });
    let report = Exporter::new(&resolver)
        .export(&tree, &mut sink, &mut NoopProgress)
        .unwrap();

    assert_eq!(report.directories_created, 0);
    assert!(report.open_target.is_none());
    assert_eq!(*collected.0.lock().unwrap(), read_tree(temp.path()));
}

#[test]
fn test_archives_on_disk_layer_over_primary() {
    let temp = TempDir::new().unwrap();
    let gnd = encode_gnd(&["a.bmp", "b.bmp"]);
    let base_path = temp.path().join("base.zip");
    fs::write(
        &base_path,
        create_test_zip(vec![
            ("data/town.gnd", &gnd[..]),
            ("data/texture/a.bmp", &b"base-a"[..]),
            ("data/texture/b.bmp", &b"base-b"[..]),
        ]),
    )
    .unwrap();
    let patch_path = temp.path().join("patch.tar");
    fs::write(
        &patch_path,
        create_test_tar(vec![("data/texture/A.BMP", &b"patch-a"[..])]),
    )
    .unwrap();

    let primary = open_source(&base_path).unwrap();
    let doc = Document::new(primary, &base_path);
    let raw = format!(
        "{},{PRIMARY_MARKER}{}",
        patch_path.display(),
        doc.primary_name()
    );
    doc.load_source_list(&raw);
    assert_eq!(doc.source_list().to_string(), raw);

    let summary = doc.walk("data\\town.rsw", &CancellationToken::new()).unwrap();
    assert!(matches!(summary, WalkSummary::Built { nodes: 4, .. }));

    let out = temp.path().join("out");
    let report = doc.export_to(&out, &mut NoopProgress).unwrap();
    // The world file is missing and its sibling ground file starts unchecked.
    assert_eq!(report.files_written, 0);

    doc.with_tree_mut(|tree| {
        let ground = tree.roots()[0];
        tree.set_checked(ground, true);
    })
    .unwrap();
    let report = doc.export_to(&out, &mut NoopProgress).unwrap();
    assert_eq!(report.files_written, 3);
    assert_eq!(report.open_target, Some(out.join("data")));

    let written = read_tree(&out);
    assert_eq!(written["data/texture/a.bmp"], b"patch-a");
    assert_eq!(written["data/texture/b.bmp"], b"base-b");
}

#[test]
fn test_unreadable_source_is_skipped() {
    let temp = TempDir::new().unwrap();
    let primary: Arc<dyn ArchiveSource> = Arc::new(
        MemorySource::new("data.zip")
            .with_file("data\\town.gnd", encode_gnd(&["a.bmp"]))
            .with_file("data\\texture\\a.bmp", b"a".to_vec()),
    );
    let doc = Document::new(primary, temp.path().join("data.zip"));
    let missing = temp.path().join("gone.zip");
    doc.load_source_list(&format!("{},<primary>:data.zip", missing.display()));

    let summary = doc.walk("data\\town.gnd", &CancellationToken::new()).unwrap();
    assert!(matches!(summary, WalkSummary::Built { nodes: 3, .. }));
    let selected = doc.with_tree(|tree| tree.selection().len()).unwrap();
    assert_eq!(selected, 2);
}

/// A source whose first read blocks until the test releases it.
#[derive(Debug)]
struct GatedSource {
    inner: MemorySource,
    blocked: AtomicBool,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl ArchiveSource for GatedSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn contains(&self, path: &NormalizedPath) -> bool {
        self.inner.contains(path)
    }

    fn read(&self, path: &NormalizedPath) -> mapx_core::Result<Vec<u8>> {
        if self.blocked.swap(false, Ordering::AcqRel) {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
        }
        self.inner.read(path)
    }
}

#[test]
fn test_walk_during_source_change_is_discarded() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let primary = Arc::new(GatedSource {
        inner: MemorySource::new("data.zip")
            .with_file("data\\town.gnd", encode_gnd(&["a.bmp"]))
            .with_file("data\\texture\\a.bmp", b"a".to_vec()),
        blocked: AtomicBool::new(true),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let doc = Arc::new(Document::new(primary, "/games/data.zip"));

    let handle = doc
        .spawn_walk("data\\town.gnd", CancellationToken::new())
        .unwrap();
    entered_rx.recv().unwrap();

    assert!(doc.is_busy());
    assert!(matches!(
        doc.walk("data\\town.gnd", &CancellationToken::new()),
        Err(MapError::ConcurrentOperation)
    ));

    let current = doc.load_source_list("/games/patch,<primary>:data.zip");
    release_tx.send(()).unwrap();

    let summary = handle.join().unwrap();
    assert_eq!(
        summary,
        WalkSummary::Stale {
            built_for: Generation(0),
            current,
        }
    );
    assert!(!doc.is_busy());
    assert!(matches!(doc.with_tree(|_| ()), Err(MapError::NoTree)));

    // The next walk picks up the new list.
    let summary = doc.walk("data\\town.gnd", &CancellationToken::new()).unwrap();
    assert!(matches!(summary, WalkSummary::Built { generation, .. } if generation == current));
    assert!(doc.is_tree_current());
}

#[test]
fn test_spawned_export_writes_files() {
    let temp = TempDir::new().unwrap();
    let primary: Arc<dyn ArchiveSource> = Arc::new(shared_texture_world());
    let doc = Arc::new(Document::new(primary, temp.path().join("base")));
    doc.walk("data\\w.rsw", &CancellationToken::new()).unwrap();

    let out = temp.path().join("out");
    let handle = doc
        .spawn_export(out.clone(), Box::new(NoopProgress))
        .unwrap();
    let report = handle.join().unwrap().unwrap();

    assert_eq!(report.files_written, 6);
    assert!(out.join("data").join("model").join("a.rsm").is_file());
}
