use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{EmbeddingIndex, IndexError, INDEX_SCHEMA_VERSION};

/// File holding the bincode-encoded vectors.
pub const VECTORS_FILE: &str = "tier1_vectors.bin";
/// File holding the JSON list of domain names, aligned with the vectors.
pub const DOMAINS_FILE: &str = "tier1_domains.json";

#[derive(Serialize, Deserialize)]
struct VectorArtifact {
    schema_version: u16,
    dimension: u32,
    vectors: Vec<Vec<f32>>,
}

/// Directory holding the two index artifacts.
///
/// `save` takes the write lock and `load` the read lock, so within a process
/// a load never observes one new artifact next to one old one. Each artifact
/// is written to a temporary file and renamed into place.
#[derive(Debug)]
pub struct IndexStore {
    dir: PathBuf,
    lock: RwLock<()>,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn vectors_path(&self) -> PathBuf {
        self.dir.join(VECTORS_FILE)
    }

    pub fn domains_path(&self) -> PathBuf {
        self.dir.join(DOMAINS_FILE)
    }

    /// True when both artifacts are present.
    pub fn exists(&self) -> bool {
        self.vectors_path().is_file() && self.domains_path().is_file()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn save(&self, index: &EmbeddingIndex) -> Result<(), IndexError> {
        let artifact = VectorArtifact {
            schema_version: INDEX_SCHEMA_VERSION,
            dimension: u32::try_from(index.dimension())
                .map_err(|_| IndexError::Data("dimension does not fit in u32".into()))?,
            vectors: index.vectors().to_vec(),
        };
        let vector_bytes = encode_to_vec(&artifact, standard())?;
        let domain_bytes = serde_json::to_vec_pretty(index.domains())
            .map_err(|e| IndexError::Encode(e.to_string()))?;

        let _guard = self.write_guard();
        fs::create_dir_all(&self.dir)?;
        write_atomic(&self.vectors_path(), &vector_bytes)?;
        write_atomic(&self.domains_path(), &domain_bytes)?;

        info!(
            dir = %self.dir.display(),
            domains = index.len(),
            dimension = index.dimension(),
            "index_saved"
        );
        Ok(())
    }

    pub fn load(&self) -> Result<EmbeddingIndex, IndexError> {
        let _guard = self.read_guard();
        let vector_bytes = read_artifact(&self.vectors_path())?;
        let domain_bytes = read_artifact(&self.domains_path())?;

        let (artifact, _): (VectorArtifact, usize) = decode_from_slice(&vector_bytes, standard())?;
        if artifact.schema_version != INDEX_SCHEMA_VERSION {
            return Err(IndexError::Data(format!(
                "unsupported index schema version {} (expected {INDEX_SCHEMA_VERSION})",
                artifact.schema_version
            )));
        }
        let domains: Vec<String> = serde_json::from_slice(&domain_bytes)?;

        if domains.len() != artifact.vectors.len() {
            return Err(IndexError::Data(format!(
                "{} lists {} domains but {} holds {} vectors",
                DOMAINS_FILE,
                domains.len(),
                VECTORS_FILE,
                artifact.vectors.len()
            )));
        }
        if let Some(bad) = artifact
            .vectors
            .iter()
            .position(|v| v.len() != artifact.dimension as usize)
        {
            return Err(IndexError::Data(format!(
                "vector {bad} does not match recorded dimension {}",
                artifact.dimension
            )));
        }

        let index = EmbeddingIndex::from_stored(domains, artifact.vectors)?;
        info!(
            dir = %self.dir.display(),
            domains = index.len(),
            dimension = index.dimension(),
            "index_loaded"
        );
        Ok(index)
    }
}

impl EmbeddingIndex {
    /// Shorthand for [`IndexStore::save`].
    pub fn persist(&self, store: &IndexStore) -> Result<(), IndexError> {
        store.save(self)
    }

    pub fn load(store: &IndexStore) -> Result<Self, IndexError> {
        store.load()
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, IndexError> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => IndexError::NotFound(path.display().to_string()),
        _ => IndexError::Io(format!("{}: {e}", path.display())),
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| IndexError::Io(format!("bad artifact path {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use semantic::StubEmbedder;

    fn sample() -> EmbeddingIndex {
        EmbeddingIndex::from_parts(
            vec!["Automotive".into(), "Travel".into()],
            vec![vec![0.6, 0.8, 0.0], vec![0.0, 0.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("artifacts"));
        assert!(!store.exists());

        let index = sample();
        index.persist(&store).unwrap();
        assert!(store.exists());

        let loaded = EmbeddingIndex::load(&store).unwrap();
        assert_eq!(loaded, index);

        let query = [0.5, 0.9, 0.1];
        assert_eq!(
            loaded.nearest(&query, 2).unwrap(),
            index.nearest(&query, 2).unwrap()
        );
    }

    #[tokio::test]
    async fn built_index_reloads_identically() {
        let descriptions = vec![
            ("Automotive".to_string(), "Domain: Automotive. Main categories: SUV, Sedan".to_string()),
            ("Travel".to_string(), "Domain: Travel. Main categories: Air Travel, Hotels".to_string()),
            ("Food & Drink".to_string(), "Domain: Food & Drink. Main categories: Cooking".to_string()),
        ];
        let embedder = StubEmbedder::new(64);
        let index = EmbeddingIndex::build(&descriptions, &embedder).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        index.persist(&store).unwrap();
        let loaded = EmbeddingIndex::load(&store).unwrap();
        assert_eq!(loaded, index);

        // Reloading the reloaded index must not drift either.
        loaded.persist(&store).unwrap();
        let again = EmbeddingIndex::load(&store).unwrap();
        assert_eq!(again, index);

        for text in ["family SUV with good fuel economy", "cheap flights and hotels", "?"] {
            let query = embedder.embed_sync(text);
            let n = index.len();
            assert_eq!(
                loaded.nearest(&query, n).unwrap(),
                index.nearest(&query, n).unwrap()
            );
        }
    }

    #[test]
    fn non_unit_stored_vectors_are_data_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        let artifact = VectorArtifact {
            schema_version: INDEX_SCHEMA_VERSION,
            dimension: 2,
            vectors: vec![vec![3.0, 4.0]],
        };
        fs::write(store.vectors_path(), encode_to_vec(&artifact, standard()).unwrap()).unwrap();
        fs::write(store.domains_path(), br#"["Automotive"]"#).unwrap();
        assert!(matches!(store.load(), Err(IndexError::Data(_))));
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        store.save(&sample()).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2, "{names:?}");
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        assert!(matches!(store.load(), Err(IndexError::NotFound(_))));

        store.save(&sample()).unwrap();
        fs::remove_file(store.domains_path()).unwrap();
        assert!(matches!(store.load(), Err(IndexError::NotFound(_))));
    }

    #[test]
    fn misaligned_artifacts_are_data_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        store.save(&sample()).unwrap();
        fs::write(store.domains_path(), br#"["Automotive"]"#).unwrap();
        assert!(matches!(store.load(), Err(IndexError::Data(_))));
    }

    #[test]
    fn corrupt_vectors_fail_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        store.save(&sample()).unwrap();
        fs::write(store.vectors_path(), b"\xff\xff\xff").unwrap();
        assert!(matches!(store.load(), Err(IndexError::Decode(_))));

        fs::write(store.domains_path(), b"not json").unwrap();
        assert!(store.load().is_err());
    }
}
