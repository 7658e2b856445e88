//! Report writers: per-KO CSV, per-module best-path CSV, and the
//! enriched per-module JSON consumed by the diagram viewer.

pub mod dk_table;
pub mod enriched;
pub mod paths_table;

pub use dk_table::{write_dk_table, KoReportRow};
pub use enriched::{build_enriched, write_enriched, ModuleReport, NodeReport};
pub use paths_table::{write_paths_table, PathReportRow};
