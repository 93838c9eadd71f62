//! Archive store access: listing and artifact transfer.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::{ClientOptions, ObjectStore};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

pub const MRMS_BUCKET: &str = "noaa-mrms-pds";
pub const MRMS_REGION: &str = "us-east-1";

/// Object-store-style access to a day-partitioned grid archive.
///
/// Injected into the QPE client so runs against a local mirror (and tests)
/// need no network.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Lists object paths under a prefix.
    async fn ls(&self, prefix: &str) -> EngineResult<Vec<String>>;

    /// Transfers one object into `dir`, returning the local path.
    async fn download(&self, path: &str, dir: &Path) -> EngineResult<PathBuf>;
}

/// Anonymous client for the public MRMS S3 bucket.
pub struct MrmsStore {
    store: Arc<dyn ObjectStore>,
}

impl MrmsStore {
    /// Transfers exceeding `timeout` surface as `SourceUnavailable`.
    pub fn new(timeout: Duration) -> EngineResult<Self> {
        let store = AmazonS3Builder::new()
            .with_bucket_name(MRMS_BUCKET)
            .with_region(MRMS_REGION)
            .with_skip_signature(true)
            .with_client_options(ClientOptions::new().with_timeout(timeout))
            .build()
            .map_err(|e| EngineError::SourceUnavailable(format!("s3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
        })
    }
}

#[async_trait]
impl ArchiveStore for MrmsStore {
    async fn ls(&self, prefix: &str) -> EngineResult<Vec<String>> {
        let prefix_path = object_store::path::Path::from(prefix);

        let metas: Vec<_> = self
            .store
            .list(Some(&prefix_path))
            .try_collect()
            .await
            .map_err(|e| EngineError::SourceUnavailable(format!("list {}: {}", prefix, e)))?;

        let paths: Vec<String> = metas.into_iter().map(|m| m.location.to_string()).collect();
        debug!(prefix, count = paths.len(), "listed archive prefix");

        Ok(paths)
    }

    async fn download(&self, path: &str, dir: &Path) -> EngineResult<PathBuf> {
        let location = object_store::path::Path::from(path);

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| EngineError::SourceUnavailable(format!("get {}: {}", path, e)))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|e| EngineError::SourceUnavailable(format!("read {}: {}", path, e)))?;

        let file_name = path
            .rsplit('/')
            .next()
            .ok_or_else(|| EngineError::InvalidInput(format!("bad object path: {}", path)))?;
        let local_path = dir.join(file_name);
        fs::write(&local_path, &bytes)
            .map_err(|e| EngineError::SourceUnavailable(format!("write {}: {}", path, e)))?;
        debug!(path, size = bytes.len(), "downloaded artifact");

        Ok(local_path)
    }
}

/// Archive mirror rooted in a local directory, following the same
/// `{DOMAIN}/{PRODUCT}/{YYYYMMDD}/...` layout as the bucket.
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArchiveStore for LocalDirStore {
    async fn ls(&self, prefix: &str) -> EngineResult<Vec<String>> {
        let dir = self.root.join(prefix);
        let entries = fs::read_dir(&dir)
            .map_err(|e| EngineError::SourceUnavailable(format!("list {}: {}", prefix, e)))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| EngineError::SourceUnavailable(format!("list {}: {}", prefix, e)))?;
            if entry.path().is_file() {
                paths.push(format!(
                    "{}/{}",
                    prefix,
                    entry.file_name().to_string_lossy()
                ));
            }
        }
        paths.sort();

        Ok(paths)
    }

    async fn download(&self, path: &str, dir: &Path) -> EngineResult<PathBuf> {
        let src = self.root.join(path);
        if !src.is_file() {
            return Err(EngineError::SourceUnavailable(format!(
                "no such object: {}",
                path
            )));
        }

        let file_name = src.file_name().expect("file path has a name");
        let local_path = dir.join(file_name);
        fs::copy(&src, &local_path)
            .map_err(|e| EngineError::SourceUnavailable(format!("copy {}: {}", path, e)))?;

        Ok(local_path)
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn seed_mirror(root: &Path) {
        let day_dir = root.join("CONUS/RadarOnly_QPE_01H_00.00/20230821");
        fs::create_dir_all(&day_dir).unwrap();
        fs::write(
            day_dir.join("MRMS_RadarOnly_QPE_01H_00.00_20230821-020000.grib2.gz"),
            b"not really grib",
        )
        .unwrap();
        fs::write(
            day_dir.join("MRMS_RadarOnly_QPE_01H_00.00_20230821-030000.grib2.gz"),
            b"not really grib",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn should_list_local_mirror_with_prefixed_paths() {
        let root = TempDir::new().unwrap();
        seed_mirror(root.path());

        let store = LocalDirStore::new(root.path());
        let paths = store
            .ls("CONUS/RadarOnly_QPE_01H_00.00/20230821")
            .await
            .unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths[0].starts_with("CONUS/RadarOnly_QPE_01H_00.00/20230821/MRMS_"));
    }

    #[tokio::test]
    async fn should_report_missing_day_as_source_unavailable() {
        let root = TempDir::new().unwrap();
        let store = LocalDirStore::new(root.path());

        let err = store
            .ls("CONUS/RadarOnly_QPE_01H_00.00/19990101")
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn should_classify_failed_transfer_as_source_unavailable() {
        let root = TempDir::new().unwrap();
        seed_mirror(root.path());

        // destination directory does not exist, so the transfer fails
        let store = LocalDirStore::new(root.path());
        let err = store
            .download(
                "CONUS/RadarOnly_QPE_01H_00.00/20230821/MRMS_RadarOnly_QPE_01H_00.00_20230821-020000.grib2.gz",
                Path::new("/nonexistent/scratch"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn should_download_into_scratch_dir() {
        let root = TempDir::new().unwrap();
        seed_mirror(root.path());
        let scratch = TempDir::new().unwrap();

        let store = LocalDirStore::new(root.path());
        let local = store
            .download(
                "CONUS/RadarOnly_QPE_01H_00.00/20230821/MRMS_RadarOnly_QPE_01H_00.00_20230821-020000.grib2.gz",
                scratch.path(),
            )
            .await
            .unwrap();

        assert!(local.is_file());
        assert_eq!(fs::read(local).unwrap(), b"not really grib");
    }
}
