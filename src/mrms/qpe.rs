//! High-level QPE snapshot fetching: listing, temporal resolution, transfer,
//! decode, scratch cleanup.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::mrms::archive::{self, ArchiveEntry, ResolveMode};
use crate::mrms::path::{day_prefix, DOMAIN_CONUS};
use crate::mrms::product::MrmsProduct;
use crate::mrms::snapshot::{decode_grib2, gunzip, GridSnapshot};
use crate::mrms::store::ArchiveStore;

/// Source of decoded QPE snapshots. The stats pipeline takes this as a trait
/// object so tests can substitute synthetic grids.
#[async_trait]
pub trait QpeSource: Send + Sync {
    /// Fetches the snapshot resolved for `target` under `mode`.
    async fn fetch_qpe(
        &self,
        product: MrmsProduct,
        target: DateTime<Utc>,
        mode: ResolveMode,
    ) -> EngineResult<GridSnapshot>;

    /// Fetches snapshots for several targets within one calendar day off a
    /// single listing. Per-target failures are skipped, not fatal.
    async fn fetch_qpe_day(
        &self,
        product: MrmsProduct,
        date: NaiveDate,
        targets: &[DateTime<Utc>],
        mode: ResolveMode,
    ) -> EngineResult<Vec<(DateTime<Utc>, GridSnapshot)>>;
}

/// QPE client over an injected archive store.
pub struct MrmsQpeClient {
    store: Arc<dyn ArchiveStore>,
    domain: &'static str,
}

impl MrmsQpeClient {
    pub fn new(store: Arc<dyn ArchiveStore>) -> Self {
        Self {
            store,
            domain: DOMAIN_CONUS,
        }
    }

    async fn day_entries(
        &self,
        product: MrmsProduct,
        date: NaiveDate,
    ) -> EngineResult<Vec<ArchiveEntry>> {
        let prefix = day_prefix(self.domain, product, date);
        let paths = self.store.ls(&prefix).await?;

        Ok(ArchiveEntry::from_listing(&paths))
    }

    /// Transfer + gunzip + decode for one resolved entry. The compressed and
    /// decompressed artifacts both live under `scratch` and are removed when
    /// the owning `TempDir` drops, on success and on error alike.
    async fn fetch_entry(
        &self,
        entry: &ArchiveEntry,
        scratch: &Path,
    ) -> EngineResult<GridSnapshot> {
        let gz_path = self.store.download(&entry.path, scratch).await?;
        let valid_time = entry.timestamp;

        tokio::task::spawn_blocking(move || {
            let grib_path = gunzip(&gz_path)?;
            decode_grib2(&grib_path, valid_time)
        })
        .await
        .map_err(|e| EngineError::DecodeError(format!("decode worker: {}", e)))?
    }
}

#[async_trait]
impl QpeSource for MrmsQpeClient {
    async fn fetch_qpe(
        &self,
        product: MrmsProduct,
        target: DateTime<Utc>,
        mode: ResolveMode,
    ) -> EngineResult<GridSnapshot> {
        let entries = self.day_entries(product, target.date_naive()).await?;
        let entry = archive::resolve(&entries, target, mode)?;
        debug!(at = %target, path = %entry.path, "resolved snapshot");

        let scratch = TempDir::new()?;
        self.fetch_entry(&entry, scratch.path()).await
    }

    async fn fetch_qpe_day(
        &self,
        product: MrmsProduct,
        date: NaiveDate,
        targets: &[DateTime<Utc>],
        mode: ResolveMode,
    ) -> EngineResult<Vec<(DateTime<Utc>, GridSnapshot)>> {
        let entries = self.day_entries(product, date).await?;

        // one scratch dir for the whole day, dropped after every snapshot is
        // extracted
        let scratch = TempDir::new()?;
        let mut snapshots = Vec::with_capacity(targets.len());

        for &target in targets {
            let fetched = match archive::resolve(&entries, target, mode) {
                Ok(entry) => self.fetch_entry(&entry, scratch.path()).await,
                Err(e) => Err(e),
            };
            match fetched {
                Ok(snapshot) => snapshots.push((target, snapshot)),
                Err(e) if e.is_recoverable() => {
                    warn!(at = %target, error = %e, "skipping snapshot");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(snapshots)
    }
}

// -- Tests -------------------------------------------------------------------
