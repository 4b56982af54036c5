//! Bundled native library handling.
//!
//! - [`table`]: which library ships for which platform
//! - [`resources`]: where the bundled bytes come from
//! - [`extract`]: putting them on disk
//! - [`loader`]: the one-shot extract-and-link sequence

pub mod extract;
pub mod loader;
pub mod resources;
pub mod table;

pub use extract::{ExtractedLibrary, NativeLibraryExtractor};
pub use loader::{DynamicLinker, LinkedLibrary, Linker, LoadState, NativeLoader};
#[cfg(feature = "archive")]
pub use resources::ArchiveResources;
pub use resources::{resources_at, DirectoryResources, ResourceSource, StaticResources};
pub use table::{lookup, supported_signatures, NativeLibraryDescriptor, CONSCRYPT_LIBRARY};
