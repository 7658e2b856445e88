//! Read-only reference tables loaded once per run: background KO
//! occurrence frequencies and the per-module KEGG path/node graphs.
//! The KO similarity graph lives in [`crate::diffusion`] next to the
//! update that consumes it.

pub mod modules;
pub mod occurrences;

pub use modules::{discover_modules, ko_to_modules, ko_universe, ModuleGraph};
pub use occurrences::KoFrequencies;
