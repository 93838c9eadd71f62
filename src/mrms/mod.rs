//! MRMS archive access: product codes, path layout, temporal resolution,
//! transfer, and GRIB2 decoding.

pub mod archive;
pub mod path;
pub mod product;
pub mod qpe;
pub mod snapshot;
pub mod store;

pub use archive::{ArchiveEntry, ResolveMode};
pub use product::MrmsProduct;
pub use qpe::{MrmsQpeClient, QpeSource};
pub use snapshot::{GridSnapshot, MM_PER_INCH};
pub use store::{ArchiveStore, LocalDirStore, MrmsStore};
