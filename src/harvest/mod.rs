//! Harvest module - pictogram extraction pipeline.
//!
//! This module provides the core of the pictogram harvester:
//! - **Types**: [`DocumentNode`], [`Candidate`], [`Description`], [`Diagnostics`]
//! - **Traversal & naming**: [`traverse`], [`naming`], [`metadata`]
//! - **Batching**: render URL resolution via [`batch::AssetBatcher`]
//! - **Minification**: [`minify`]
//! - **Pipeline**: Async executor via [`pipeline::HarvestPipeline`]

pub mod batch;
pub mod metadata;
pub mod minify;
pub mod naming;
pub mod pipeline;
pub mod traits;
pub mod traverse;

// Re-export commonly used types
pub use traits::{
    Candidate, ComponentIndex, ComponentMetadata, Description, Diagnostic, Diagnostics,
    DocumentFile, DocumentNode, ImageUrls, Keywords, NodeKind, Severity,
};

pub use batch::{AssetBatcher, BatchError, CandidateMap, DEFAULT_BATCH_SIZE};
pub use minify::{mark_color_immutable, minify_svg, MinifyError, COLOR_IMMUTABLE_CLASS};
pub use pipeline::{HarvestPipeline, HarvestResult, HarvestStats, PipelineError};
