pub mod analysis;
pub mod config;
pub mod discovery;
pub mod logging;
pub mod metadata;
pub mod normalize;
pub mod probe;
pub mod report;
pub mod scoring;

pub use analysis::{analyze, run, Analysis, AnalysisOptions, RunSettings, RunSummary, SkippedFile};
pub use discovery::{discover, DiscoveredFile, DiscoveryOptions};
pub use metadata::{NormalizedMetadata, RawMetadata, VideoCodecFamily};
pub use normalize::{normalize, normalize_with, NormalizeOptions};
pub use probe::{FfprobeProbe, MetadataProbe, ProbeBackend};
pub use report::{rank, write_csv, ReportRow};
pub use scoring::{score, ScoreBreakdown};
