//! Template registry
//!
//! Maps template names to the repository they are cloned from. The list is loaded from a fresh
//! on-disk cache, then from the configured mirrors, then from a stale cache, and finally from a
//! snapshot compiled into the binary.

mod registry;
mod scaffold;

pub use registry::{
    RegistryLoader, RegistryOrigin, ResolvedTemplate, TemplateEntry, TemplateRegistry,
    CACHE_FILE_NAME,
};
pub use scaffold::{rewrite_package_json, ManifestEdits};
