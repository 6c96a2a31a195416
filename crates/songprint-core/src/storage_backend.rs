//! Feature store trait and implementations
//!
//! [`FilesystemStore`] keeps one blob per descriptor under `features/`, a
//! JSON index of lightweight entries in `index.json` and optional cover art
//! under `covers/`. [`MemoryStore`] keeps everything in process.

use crate::descriptor::{file_stem, now_timestamp, UNKNOWN_ARTIST};
use crate::error::StoreError;
use crate::storage_config::{FilesystemConfig, SongprintStorageConfig, StorageBackendKind};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::Serialize;
use songprint_fp::blob::{self, write_atomic};
use songprint_fp::{descriptor_id, BlobFormat, Descriptor, IndexEntry, MetadataPatch};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

const FEATURES_DIR: &str = "features";
const COVERS_DIR: &str = "covers";
const INDEX_FILE: &str = "index.json";

/// Persistence interface for descriptors.
///
/// Reads degrade to not-found / empty on I/O or decode failures (logged);
/// writes report failure.
pub trait FeatureStore: Send + Sync {
    /// Insert or replace the descriptor keyed by `md5(file_name)`.
    ///
    /// Returns true if the id was not stored before.
    fn add(&self, descriptor: Descriptor) -> Result<bool, StoreError>;

    fn get(&self, id: &str) -> Option<Descriptor>;

    /// Lightweight entries ordered by id.
    fn list(&self) -> Vec<IndexEntry>;

    /// Delete the descriptor, its index entry and cover. False if unknown.
    fn remove(&self, id: &str) -> Result<bool, StoreError>;

    /// Patch metadata without re-extraction. False if unknown.
    fn update_metadata(&self, id: &str, patch: &MetadataPatch) -> Result<bool, StoreError>;

    /// Attach cover art copied from `source`. False if unknown.
    fn set_cover(&self, id: &str, source: &Path) -> Result<bool, StoreError>;

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Open the store selected by configuration.
pub fn open_store(config: &SongprintStorageConfig) -> Result<Box<dyn FeatureStore>, StoreError> {
    match config.storage.backend {
        StorageBackendKind::Filesystem => {
            Ok(Box::new(FilesystemStore::open(&config.storage.filesystem)?))
        }
        StorageBackendKind::Memory => Ok(Box::new(MemoryStore::new())),
    }
}

/// Store a path relative to `media_root` (with `/` separators) when it lies
/// under it; anything else is kept as given.
pub fn normalize_file_path(file_path: &str, media_root: Option<&Path>) -> String {
    let path = Path::new(file_path);
    let Some(root) = media_root else {
        return file_path.to_string();
    };
    if !path.is_absolute() {
        return file_path.to_string();
    }
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => file_path.to_string(),
    }
}

/// Fill in metadata defaults. Returns true if anything was missing.
fn apply_defaults(descriptor: &mut Descriptor) -> bool {
    let mut changed = false;
    if descriptor.song_name.is_empty() {
        descriptor.song_name = file_stem(&descriptor.file_name);
        changed = true;
    }
    if descriptor.author.is_empty() {
        descriptor.author = UNKNOWN_ARTIST.to_string();
        changed = true;
    }
    if descriptor.added_time.is_empty() {
        descriptor.added_time = now_timestamp();
        changed = true;
    }
    changed
}

/// Outcome of [`FilesystemStore::repair`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairReport {
    /// Entries in the rebuilt index
    pub entries: usize,
    /// Blobs rewritten under their recomputed id
    pub rekeyed: usize,
    /// Blobs that were missing song name, author or timestamp
    pub defaulted: usize,
    /// Previous index entries without a readable blob
    pub dropped: usize,
    /// Extra blobs for an id that already had one
    pub duplicates: usize,
    /// Blobs that could not be decoded
    pub unreadable: Vec<PathBuf>,
}

/// Filesystem-based feature store
pub struct FilesystemStore {
    root: PathBuf,
    format: BlobFormat,
    media_root: Option<PathBuf>,
    index: RwLock<BTreeMap<String, IndexEntry>>,
}

impl FilesystemStore {
    /// Open (or create) a store. A missing or unreadable index is rebuilt
    /// from the blobs.
    pub fn open(config: &FilesystemConfig) -> Result<Self, StoreError> {
        let store = Self {
            root: config.database_root.clone(),
            format: config.format,
            media_root: config.media_root.clone(),
            index: RwLock::new(BTreeMap::new()),
        };
        for dir in [store.features_dir(), store.covers_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }

        match store.read_index() {
            Ok(Some(index)) => {
                log::info!(
                    "Opened feature store {} ({} entries)",
                    store.root.display(),
                    index.len()
                );
                *store.index.write() = index;
            }
            Ok(None) => {
                store.repair()?;
            }
            Err(e) => {
                log::warn!("Index {} is unreadable ({}), rebuilding", store.index_path().display(), e);
                store.repair()?;
            }
        }
        Ok(store)
    }

    /// Open a JSON store at `root` without a media root.
    pub fn open_at(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open(&FilesystemConfig {
            database_root: root.into(),
            ..Default::default()
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn features_dir(&self) -> PathBuf {
        self.root.join(FEATURES_DIR)
    }

    fn covers_dir(&self) -> PathBuf {
        self.root.join(COVERS_DIR)
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Blob path for `id` in the given format.
    pub fn blob_path(&self, id: &str, format: BlobFormat) -> PathBuf {
        self.features_dir().join(format!("{}.{}", id, format.extension()))
    }

    /// Existing blob for `id`, preferring the configured format.
    fn find_blob(&self, id: &str) -> Option<PathBuf> {
        std::iter::once(self.format)
            .chain(BlobFormat::ALL.into_iter().filter(|f| *f != self.format))
            .map(|f| self.blob_path(id, f))
            .find(|p| p.exists())
    }

    fn read_index(&self) -> Result<Option<BTreeMap<String, IndexEntry>>, StoreError> {
        let path = self.index_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        let mut index: BTreeMap<String, IndexEntry> = serde_json::from_str(&content)?;
        for (id, entry) in index.iter_mut() {
            entry.id = id.clone();
        }
        Ok(Some(index))
    }

    fn write_index(&self, index: &BTreeMap<String, IndexEntry>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(index)?;
        write_atomic(&self.index_path(), json.as_bytes())?;
        Ok(())
    }

    fn remove_file_if_exists(path: &Path) -> Result<(), StoreError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Write the blob in the configured format and drop copies in other formats.
    fn write_blob(&self, descriptor: &Descriptor) -> Result<(), StoreError> {
        blob::save(descriptor, &self.blob_path(&descriptor.id, self.format), self.format)?;
        for other in BlobFormat::ALL.into_iter().filter(|f| *f != self.format) {
            Self::remove_file_if_exists(&self.blob_path(&descriptor.id, other))?;
        }
        Ok(())
    }

    fn cover_files(&self, id: &str) -> Vec<PathBuf> {
        let prefix = format!("cover_{}.", id);
        std::fs::read_dir(self.covers_dir())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| {
                        p.file_name()
                            .and_then(|n| n.to_str())
                            .map_or(false, |n| n.starts_with(&prefix))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rebuild `index.json` from the blobs under `features/`.
    ///
    /// Ids are recomputed from the stored file names; blobs stored under a
    /// different name are rewritten under the right one, and missing
    /// metadata defaults are filled in.
    pub fn repair(&self) -> Result<RepairReport, StoreError> {
        let features_dir = self.features_dir();
        let entries = std::fs::read_dir(&features_dir).map_err(|e| StoreError::io(&features_dir, e))?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("tmp") {
                log::warn!("Removing leftover temporary file {}", path.display());
                Self::remove_file_if_exists(&path)?;
            } else if BlobFormat::from_path(&path).is_some() {
                files.push(path);
            }
        }
        files.sort();

        let loaded: Vec<(PathBuf, Result<Descriptor, String>)> = files
            .into_par_iter()
            .map(|path| {
                let result = blob::load_auto(&path).map_err(|e| e.to_string());
                (path, result)
            })
            .collect();

        let mut report = RepairReport::default();
        let mut index = BTreeMap::new();
        let previous = self.index.read().clone();

        for (path, result) in loaded {
            let mut descriptor = match result {
                Ok(d) if !d.file_name.is_empty() => d,
                Ok(_) => {
                    log::warn!("Blob {} has no file name, skipping", path.display());
                    report.unreadable.push(path);
                    continue;
                }
                Err(e) => {
                    log::warn!("Failed to load {}: {}", path.display(), e);
                    report.unreadable.push(path);
                    continue;
                }
            };

            let id = descriptor_id(&descriptor.file_name);
            if index.contains_key(&id) {
                log::warn!("Duplicate blob {} for id {}, removing", path.display(), id);
                Self::remove_file_if_exists(&path)?;
                report.duplicates += 1;
                continue;
            }

            let stem_matches = path.file_stem().and_then(|s| s.to_str()) == Some(id.as_str());
            let rekey = descriptor.id != id || !stem_matches;
            let defaulted = apply_defaults(&mut descriptor);
            descriptor.id = id.clone();

            if rekey || defaulted {
                let format = BlobFormat::from_path(&path).unwrap_or(self.format);
                let target = self.blob_path(&id, format);
                blob::save(&descriptor, &target, format)?;
                if target != path {
                    Self::remove_file_if_exists(&path)?;
                }
                report.rekeyed += usize::from(rekey);
                report.defaulted += usize::from(defaulted);
            }
            index.insert(id, descriptor.index_entry());
        }

        report.dropped = previous.keys().filter(|id| !index.contains_key(*id)).count();
        report.entries = index.len();

        self.write_index(&index)?;
        *self.index.write() = index;

        log::info!(
            "Repaired index {}: {} entries, {} rekeyed, {} defaulted, {} dropped, {} unreadable",
            self.index_path().display(),
            report.entries,
            report.rekeyed,
            report.defaulted,
            report.dropped,
            report.unreadable.len()
        );
        Ok(report)
    }
}

impl FeatureStore for FilesystemStore {
    fn add(&self, mut descriptor: Descriptor) -> Result<bool, StoreError> {
        if descriptor.file_name.is_empty() {
            return Err(StoreError::MissingFileName);
        }
        descriptor.id = descriptor_id(&descriptor.file_name);
        descriptor.file_path = normalize_file_path(&descriptor.file_path, self.media_root.as_deref());
        apply_defaults(&mut descriptor);

        // Blob first: an index entry never points at a missing blob
        self.write_blob(&descriptor)?;

        let mut index = self.index.write();
        let is_new = index
            .insert(descriptor.id.clone(), descriptor.index_entry())
            .is_none();
        self.write_index(&index)?;

        log::debug!(
            "{} {} ({})",
            if is_new { "Added" } else { "Replaced" },
            descriptor.id,
            descriptor.file_name
        );
        Ok(is_new)
    }

    fn get(&self, id: &str) -> Option<Descriptor> {
        let path = self.find_blob(id)?;
        match blob::load_auto(&path) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                log::warn!("Failed to load {}: {}", path.display(), e);
                None
            }
        }
    }

    fn list(&self) -> Vec<IndexEntry> {
        self.index.read().values().cloned().collect()
    }

    fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let known = self.index.read().contains_key(id) || self.find_blob(id).is_some();
        if !known {
            return Ok(false);
        }

        for format in BlobFormat::ALL {
            Self::remove_file_if_exists(&self.blob_path(id, format))?;
        }

        let removed = {
            let mut index = self.index.write();
            let removed = index.remove(id);
            self.write_index(&index)?;
            removed
        };

        let mut covers = self.cover_files(id);
        if let Some(cover) = removed.as_ref().and_then(|e| e.cover_path.as_ref()) {
            let path = self.root.join(cover);
            if path.starts_with(self.covers_dir()) && !covers.contains(&path) {
                covers.push(path);
            }
        }
        for cover in covers {
            Self::remove_file_if_exists(&cover)?;
        }

        log::debug!("Removed {}", id);
        Ok(true)
    }

    fn update_metadata(&self, id: &str, patch: &MetadataPatch) -> Result<bool, StoreError> {
        if !self.index.read().contains_key(id) {
            return Ok(false);
        }
        let path = self
            .find_blob(id)
            .ok_or_else(|| StoreError::UnknownId(id.to_string()))?;
        let mut descriptor = blob::load_auto(&path)?;
        if descriptor.apply_patch(patch) {
            self.write_blob(&descriptor)?;
        }

        let mut index = self.index.write();
        if let Some(entry) = index.get_mut(id) {
            entry.apply_patch(patch);
        }
        self.write_index(&index)?;
        Ok(true)
    }

    fn set_cover(&self, id: &str, source: &Path) -> Result<bool, StoreError> {
        if !self.index.read().contains_key(id) {
            return Ok(false);
        }
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "png".to_string());
        let file_name = format!("cover_{}.{}", id, ext);
        let target = self.covers_dir().join(&file_name);

        for stale in self.cover_files(id).into_iter().filter(|p| *p != target) {
            Self::remove_file_if_exists(&stale)?;
        }
        std::fs::copy(source, &target).map_err(|e| StoreError::io(source, e))?;

        let patch = MetadataPatch {
            cover_path: Some(format!("{}/{}", COVERS_DIR, file_name)),
            ..Default::default()
        };
        self.update_metadata(id, &patch)
    }
}

/// In-memory feature store
#[derive(Default)]
pub struct MemoryStore {
    descriptors: RwLock<BTreeMap<String, Descriptor>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeatureStore for MemoryStore {
    fn add(&self, mut descriptor: Descriptor) -> Result<bool, StoreError> {
        if descriptor.file_name.is_empty() {
            return Err(StoreError::MissingFileName);
        }
        descriptor.id = descriptor_id(&descriptor.file_name);
        apply_defaults(&mut descriptor);
        Ok(self
            .descriptors
            .write()
            .insert(descriptor.id.clone(), descriptor)
            .is_none())
    }

    fn get(&self, id: &str) -> Option<Descriptor> {
        self.descriptors.read().get(id).cloned()
    }

    fn list(&self) -> Vec<IndexEntry> {
        self.descriptors
            .read()
            .values()
            .map(Descriptor::index_entry)
            .collect()
    }

    fn remove(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.descriptors.write().remove(id).is_some())
    }

    fn update_metadata(&self, id: &str, patch: &MetadataPatch) -> Result<bool, StoreError> {
        Ok(match self.descriptors.write().get_mut(id) {
            Some(descriptor) => {
                descriptor.apply_patch(patch);
                true
            }
            None => false,
        })
    }

    fn set_cover(&self, id: &str, source: &Path) -> Result<bool, StoreError> {
        let patch = MetadataPatch {
            cover_path: Some(source.to_string_lossy().into_owned()),
            ..Default::default()
        };
        self.update_metadata(id, &patch)
    }

    fn len(&self) -> usize {
        self.descriptors.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songprint_fp::Fingerprint;

    fn descriptor(file_name: &str) -> Descriptor {
        Descriptor {
            file_name: file_name.to_string(),
            file_path: format!("/srv/music/albums/{}", file_name),
            duration_seconds: 3.5,
            mfcc_mean: vec![0.5; 120],
            energy_distribution: vec![0.1; 10],
            fingerprint: Fingerprint::from_rows(vec![vec![1, 0, 1, 0]; 4]),
            ..Default::default()
        }
    }

    fn open(dir: &Path, format: BlobFormat) -> FilesystemStore {
        FilesystemStore::open(&FilesystemConfig {
            database_root: dir.to_path_buf(),
            format,
            media_root: Some(PathBuf::from("/srv/music")),
        })
        .unwrap()
    }

    #[test]
    fn test_normalize_file_path() {
        let root = Path::new("/srv/music");
        assert_eq!(normalize_file_path("/srv/music/a/b.mp3", Some(root)), "a/b.mp3");
        assert_eq!(normalize_file_path("/other/b.mp3", Some(root)), "/other/b.mp3");
        assert_eq!(normalize_file_path("rel/b.mp3", Some(root)), "rel/b.mp3");
        assert_eq!(normalize_file_path("/srv/music/b.mp3", None), "/srv/music/b.mp3");
    }

    #[test]
    fn test_add_get_list_with_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), BlobFormat::Json);

        assert!(store.add(descriptor("song.mp3")).unwrap());
        let id = descriptor_id("song.mp3");

        assert!(dir.path().join("features").join(format!("{id}.json")).exists());
        assert!(dir.path().join("index.json").exists());

        let stored = store.get(&id).unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.file_path, "albums/song.mp3");
        assert_eq!(stored.song_name, "song");
        assert_eq!(stored.author, UNKNOWN_ARTIST);

        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].file_name, "song.mp3");

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("index.json")).unwrap())
                .unwrap();
        assert!(raw[&id].get("mfcc_mean").is_none());
        assert_eq!(raw[&id]["file_name"], "song.mp3");
    }

    #[test]
    fn test_readd_is_idempotent_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), BlobFormat::Bson);
        let d = descriptor("song.mp3");

        assert!(store.add(d.clone()).unwrap());
        assert!(!store.add(d.clone()).unwrap());
        assert_eq!(store.len(), 1);

        let mut changed = d;
        changed.duration_seconds = 9.0;
        assert!(!store.add(changed).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].duration, 9.0);
    }

    #[test]
    fn test_add_without_file_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), BlobFormat::Json);
        assert!(matches!(
            store.add(Descriptor::default()),
            Err(StoreError::MissingFileName)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_metadata_patches_index_and_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), BlobFormat::Packed);
        store.add(descriptor("song.mp3")).unwrap();
        let id = descriptor_id("song.mp3");

        let patch = MetadataPatch {
            song_name: Some("Real Title".to_string()),
            author: Some("Someone".to_string()),
            cover_path: None,
        };
        assert!(store.update_metadata(&id, &patch).unwrap());
        assert!(!store.update_metadata("missing", &patch).unwrap());

        assert_eq!(store.get(&id).unwrap().song_name, "Real Title");
        assert_eq!(store.list()[0].author, "Someone");

        let reopened = open(dir.path(), BlobFormat::Packed);
        assert_eq!(reopened.list()[0].song_name, "Real Title");
    }

    #[test]
    fn test_remove_deletes_blob_index_and_cover() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), BlobFormat::Json);
        store.add(descriptor("song.mp3")).unwrap();
        let id = descriptor_id("song.mp3");

        let art = dir.path().join("art.JPG");
        std::fs::write(&art, b"jpeg").unwrap();
        assert!(store.set_cover(&id, &art).unwrap());
        let cover = dir.path().join("covers").join(format!("cover_{id}.jpg"));
        assert!(cover.exists());
        assert_eq!(
            store.get(&id).unwrap().cover_path.as_deref(),
            Some(format!("covers/cover_{id}.jpg").as_str())
        );

        assert!(store.remove(&id).unwrap());
        assert!(!cover.exists());
        assert!(!store.blob_path(&id, BlobFormat::Json).exists());
        assert!(store.get(&id).is_none());
        assert!(store.list().is_empty());
        assert!(!store.remove(&id).unwrap());
    }

    #[test]
    fn test_set_cover_on_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), BlobFormat::Json);
        let art = dir.path().join("art.png");
        std::fs::write(&art, b"png").unwrap();
        assert!(!store.set_cover("nope", &art).unwrap());
    }

    #[test]
    fn test_missing_index_is_rebuilt_on_open() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open(dir.path(), BlobFormat::Json);
            store.add(descriptor("a.mp3")).unwrap();
            store.add(descriptor("b.mp3")).unwrap();
        }
        std::fs::remove_file(dir.path().join("index.json")).unwrap();

        let store = open(dir.path(), BlobFormat::Json);
        let ids: Vec<String> = store.list().into_iter().map(|e| e.id).collect();
        let mut expected = vec![descriptor_id("a.mp3"), descriptor_id("b.mp3")];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_corrupt_index_is_rebuilt_on_open() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open(dir.path(), BlobFormat::Json);
            store.add(descriptor("a.mp3")).unwrap();
        }
        std::fs::write(dir.path().join("index.json"), "{ not json").unwrap();
        let store = open(dir.path(), BlobFormat::Json);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_repair_rekeys_defaults_and_drops() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), BlobFormat::Json);
        store.add(descriptor("kept.mp3")).unwrap();
        store.add(descriptor("gone.mp3")).unwrap();

        // Blob deleted behind the store's back
        std::fs::remove_file(store.blob_path(&descriptor_id("gone.mp3"), BlobFormat::Json)).unwrap();

        // Blob written by hand under a wrong name without metadata
        let stray = Descriptor {
            id: "wrong".to_string(),
            ..descriptor("stray.mp3")
        };
        blob::save(&stray, &store.blob_path("wrong", BlobFormat::Json), BlobFormat::Json).unwrap();

        // Garbage blob
        std::fs::write(dir.path().join("features").join("junk.json"), "nope").unwrap();

        let report = store.repair().unwrap();
        assert_eq!(report.entries, 2);
        assert_eq!(report.rekeyed, 1);
        assert_eq!(report.defaulted, 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.unreadable.len(), 1);

        let stray_id = descriptor_id("stray.mp3");
        assert!(store.blob_path(&stray_id, BlobFormat::Json).exists());
        assert!(!store.blob_path("wrong", BlobFormat::Json).exists());
        let repaired = store.get(&stray_id).unwrap();
        assert_eq!(repaired.song_name, "stray");
        assert_eq!(repaired.author, UNKNOWN_ARTIST);
        assert!(!repaired.added_time.is_empty());
    }

    #[test]
    fn test_format_change_keeps_blobs_readable() {
        let dir = tempfile::tempdir().unwrap();
        open(dir.path(), BlobFormat::Json).add(descriptor("a.mp3")).unwrap();

        let store = open(dir.path(), BlobFormat::Packed);
        let id = descriptor_id("a.mp3");
        assert!(store.get(&id).is_some());

        store.add(descriptor("a.mp3")).unwrap();
        assert!(store.blob_path(&id, BlobFormat::Packed).exists());
        assert!(!store.blob_path(&id, BlobFormat::Json).exists());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.add(descriptor("a.mp3")).unwrap());
        assert!(!store.add(descriptor("a.mp3")).unwrap());
        let id = descriptor_id("a.mp3");
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get(&id).unwrap().file_path, "/srv/music/albums/a.mp3");
        assert!(store.remove(&id).unwrap());
        assert!(store.is_empty());
        assert!(!store.remove(&id).unwrap());
    }

    #[test]
    fn test_open_store_by_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = SongprintStorageConfig::default_filesystem(dir.path());
        let store = open_store(&config).unwrap();
        store.add(descriptor("a.mp3")).unwrap();
        assert!(dir.path().join("index.json").exists());

        let memory = open_store(&SongprintStorageConfig::default_memory()).unwrap();
        assert!(memory.is_empty());
    }
}
