//! Pictogram harvest pipeline executor.
//!
//! This module provides the [`HarvestPipeline`] coordinator that executes
//! the extraction stages sequentially (Document → Traversal → URL Batching →
//! Download → Manifest) with:
//! - Async execution via `tokio`, one network call in flight at a time
//! - Structured logging via `tracing`
//! - Non-fatal problems collected in a caller-owned [`Diagnostics`]

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::executor::DownloadExecutor;
use crate::harvest::batch::{AssetBatcher, BatchError, DEFAULT_BATCH_SIZE};
use crate::harvest::traits::{Candidate, Diagnostics};
use crate::harvest::traverse::collect_candidates;
use crate::model::{Manifest, ManifestError, MANIFEST_FILE_NAME};
use crate::traits::{AssetFetcher, DocumentSource, SourceError};

// ============================================================================
// Pipeline Types
// ============================================================================

/// Complete harvest result with manifest and statistics.
#[derive(Debug)]
pub struct HarvestResult {
    /// The manifest as written
    pub manifest: Manifest,

    /// Where the manifest was written
    pub manifest_path: PathBuf,

    /// Performance and processing statistics
    pub stats: HarvestStats,
}

/// Statistics about the harvest run.
#[derive(Debug, Default, Clone)]
pub struct HarvestStats {
    /// Total time spent on the entire run (milliseconds)
    pub total_duration_ms: u64,

    /// Time spent fetching the document (milliseconds)
    pub document_duration_ms: u64,

    /// Time spent resolving render URLs (milliseconds)
    pub resolution_duration_ms: u64,

    /// Time spent downloading and writing pictograms (milliseconds)
    pub download_duration_ms: u64,

    /// Candidates found by traversal
    pub candidates: usize,

    /// Candidates left without a file name or URL
    pub invalid: usize,

    /// Pictogram files written
    pub written: usize,

    /// Downloads that failed or were rejected
    pub failed_downloads: usize,

    /// Pictograms downloaded but not written
    pub failed_writes: usize,
}

// ============================================================================
// Pipeline Errors
// ============================================================================

/// Errors that end a pipeline run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The document tree could not be fetched
    #[error("File request failed: {0}")]
    DocumentFetch(#[source] SourceError),

    /// A render URL batch was rejected
    #[error(transparent)]
    UrlResolution(#[from] BatchError),

    /// The manifest could not be written
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The run completed but recorded diagnostics
    #[error("Finished with {count} errors")]
    FinishedWithErrors { count: usize },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Sequential pictogram extraction pipeline.
///
/// The pipeline coordinates:
/// 1. **Document**: fetch the document tree and component descriptions
/// 2. **Traversal**: collect one [`Candidate`] per visible component
/// 3. **Batching**: resolve render URLs in fixed-size chunks
/// 4. **Download**: fetch, minify and write every valid pictogram
/// 5. **Manifest**: write `index.json` for every valid pictogram
///
/// # Example
///
/// ```ignore
/// use pictogram_harvester::harvest::HarvestPipeline;
/// use pictogram_harvester::harvest::Diagnostics;
///
/// let pipeline = HarvestPipeline::new(figma, fetcher, "1.2.0")
///     .with_batch_size(200)
///     .with_output_dir("pictograms");
///
/// let mut diagnostics = Diagnostics::new();
/// let result = pipeline.execute(&mut diagnostics).await?;
/// println!("Wrote {} pictograms", result.stats.written);
/// ```
pub struct HarvestPipeline<S, F>
where
    S: DocumentSource,
    F: AssetFetcher,
{
    /// Document tree and render URL service
    source: S,

    /// Raw asset downloader
    fetcher: F,

    /// Version recorded in the manifest
    version: String,

    /// Node ids per render URL request (default: 200)
    batch_size: usize,

    /// Directory receiving the pictograms and the manifest
    output_dir: PathBuf,
}

impl<S, F> HarvestPipeline<S, F>
where
    S: DocumentSource,
    F: AssetFetcher,
{
    /// Creates a new pipeline.
    ///
    /// Default configuration:
    /// - Batch size: 200
    /// - Output directory: `pictograms`
    pub fn new(source: S, fetcher: F, version: impl Into<String>) -> Self {
        Self {
            source,
            fetcher,
            version: version.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            output_dir: PathBuf::from("pictograms"),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Executes the complete pipeline.
    ///
    /// Problems with individual pictograms are recorded in `diagnostics` and
    /// never stop the run. The manifest is written once all downloads have
    /// been attempted, whatever their outcome.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if:
    /// - The document or a render URL batch is rejected (nothing is written)
    /// - The output directory or manifest cannot be written
    /// - The run recorded any diagnostic ([`PipelineError::FinishedWithErrors`])
    pub async fn execute(
        &self,
        diagnostics: &mut Diagnostics,
    ) -> Result<HarvestResult, PipelineError> {
        let start = Instant::now();
        let mut stats = HarvestStats::default();

        // ====================================================================
        // Stage 1: Document
        // ====================================================================

        let document_start = Instant::now();
        let file = self
            .source
            .file()
            .await
            .map_err(PipelineError::DocumentFetch)?;
        stats.document_duration_ms = document_start.elapsed().as_millis() as u64;
        info!(duration_ms = stats.document_duration_ms, "Loaded file from figma");

        // ====================================================================
        // Stage 2: Traversal
        // ====================================================================

        let candidates = collect_candidates(&file.document, &file.components, diagnostics);
        stats.candidates = candidates.len();
        info!("Found {} pictograms", stats.candidates);

        // ====================================================================
        // Stage 3: Render URL batching
        // ====================================================================

        let resolution_start = Instant::now();
        let candidates = AssetBatcher::new(&self.source)
            .with_batch_size(self.batch_size)
            .resolve(candidates, diagnostics)
            .await?;
        stats.resolution_duration_ms = resolution_start.elapsed().as_millis() as u64;

        let (valid, invalid): (Vec<&Candidate>, Vec<&Candidate>) =
            candidates.iter().partition(|c| c.is_valid());
        stats.invalid = invalid.len();
        if !invalid.is_empty() {
            let listing: Vec<String> = invalid
                .iter()
                .map(|c| format!(" - {}", c.path_display()))
                .collect();
            info!(
                "Found {} invalid pictograms:\n{}",
                invalid.len(),
                listing.join("\n")
            );
        }

        // ====================================================================
        // Stage 4: Download
        // ====================================================================

        let download_start = Instant::now();
        let valid: Vec<Candidate> = valid.into_iter().cloned().collect();
        let downloads = DownloadExecutor::new(&self.fetcher, &self.output_dir)
            .execute(&valid, diagnostics)
            .await?;
        stats.download_duration_ms = download_start.elapsed().as_millis() as u64;
        stats.written = downloads.written;
        stats.failed_downloads = downloads.failed_downloads;
        stats.failed_writes = downloads.failed_writes;

        // ====================================================================
        // Stage 5: Manifest
        // ====================================================================

        info!("Generating {}", MANIFEST_FILE_NAME);
        let manifest = Manifest::from_candidates(self.version.clone(), &valid);
        let manifest_path = self.output_dir.join(MANIFEST_FILE_NAME);
        manifest.write(&manifest_path)?;

        stats.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(
            duration_ms = stats.total_duration_ms,
            candidates = stats.candidates,
            invalid = stats.invalid,
            written = stats.written,
            failed_downloads = stats.failed_downloads,
            failed_writes = stats.failed_writes,
            "Harvest completed"
        );

        if !diagnostics.is_empty() {
            for diagnostic in diagnostics.iter() {
                info!("{}", diagnostic);
            }
            return Err(PipelineError::FinishedWithErrors {
                count: diagnostics.len(),
            });
        }

        info!("Successfully completed");
        Ok(HarvestResult {
            manifest,
            manifest_path,
            stats,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::traits::{
        ComponentIndex, ComponentMetadata, DocumentFile, DocumentNode, ImageUrls, NodeKind,
        Severity,
    };
    use crate::traits::FetchedAsset;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Mock document source with a small pictogram page
    struct MockSource {
        fail_file: bool,
        fail_images: bool,
        unrendered: Vec<&'static str>,
        // Plain component names replacing the default page content
        page: Vec<&'static str>,
        image_requests: AtomicUsize,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                fail_file: false,
                fail_images: false,
                unrendered: vec![],
                page: vec![],
                image_requests: AtomicUsize::new(0),
            }
        }
    }

    fn node(id: &str, name: &str, kind: NodeKind, children: Vec<DocumentNode>) -> DocumentNode {
        DocumentNode {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            children,
        }
    }

    #[async_trait]
    impl DocumentSource for MockSource {
        async fn file(&self) -> Result<DocumentFile, SourceError> {
            if self.fail_file {
                return Err(SourceError::Status {
                    status: 403,
                    message: "Forbidden".to_string(),
                });
            }

            let children = if self.page.is_empty() {
                vec![
                    node("1:1", "Home", NodeKind::Component, vec![]),
                    node(
                        "1:2",
                        "Navigation/Arrow",
                        NodeKind::ComponentSet,
                        vec![node("1:3", "direction=left, value=2", NodeKind::Component, vec![])],
                    ),
                ]
            } else {
                self.page
                    .iter()
                    .enumerate()
                    .map(|(i, name)| node(&format!("2:{i}"), name, NodeKind::Component, vec![]))
                    .collect()
            };
            let document = node(
                "0:0",
                "Document",
                NodeKind::Document,
                vec![node("0:1", "Pictograms", NodeKind::Canvas, children)],
            );

            let mut components = ComponentIndex::new();
            components.insert(
                "1:1".to_string(),
                ComponentMetadata {
                    description: r#"{"color":true,"keywords":"house"}"#.to_string(),
                    ..Default::default()
                },
            );
            components.insert(
                "1:3".to_string(),
                ComponentMetadata {
                    description: r#"{"scalable":true}"#.to_string(),
                    ..Default::default()
                },
            );

            Ok(DocumentFile {
                document,
                components,
            })
        }

        async fn image_urls(&self, ids: &[String]) -> Result<ImageUrls, SourceError> {
            self.image_requests.fetch_add(1, Ordering::SeqCst);
            if self.fail_images {
                return Err(SourceError::Api("render failed".to_string()));
            }
            let mut urls = ImageUrls::default();
            for id in ids {
                let url = (!self.unrendered.contains(&id.as_str()))
                    .then(|| format!("mock://{id}"));
                urls.images.insert(id.clone(), url);
            }
            Ok(urls)
        }
    }

    // Mock fetcher failing for listed URLs
    struct MockFetcher {
        failing: Vec<&'static str>,
    }

    #[async_trait]
    impl AssetFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedAsset, SourceError> {
            if self.failing.contains(&url) {
                return Ok(FetchedAsset {
                    status: 500,
                    body: String::new(),
                });
            }
            Ok(FetchedAsset {
                status: 200,
                body: r#"<svg viewBox="0 0 24 24"><path d="M0 0"/></svg>"#.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_pipeline_execution() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = HarvestPipeline::new(MockSource::new(), MockFetcher { failing: vec![] }, "3.1.0")
            .with_output_dir(dir.path());

        let mut diagnostics = Diagnostics::new();
        let result = pipeline.execute(&mut diagnostics).await.unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(result.stats.candidates, 2);
        assert_eq!(result.stats.written, 2);
        assert_eq!(result.manifest.version, "3.1.0");

        let names: Vec<&str> = result.manifest.pictograms.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["home", "arrow-2-left"]);
        assert_eq!(
            result.manifest.pictograms[1].tags,
            vec!["Pictograms", "Navigation/Arrow", "direction=left, value=2"]
        );
        assert_eq!(result.manifest.pictograms[1].scalable, Some(true));

        // Colored pictograms are left unmarked
        let home = std::fs::read_to_string(dir.path().join("home.svg")).unwrap();
        assert!(!home.contains("color-immutable"));
        let arrow = std::fs::read_to_string(dir.path().join("arrow-2-left.svg")).unwrap();
        assert!(arrow.starts_with(r#"<svg class="color-immutable""#));

        assert_eq!(Manifest::read(&result.manifest_path).unwrap(), result.manifest);
    }

    #[tokio::test]
    async fn test_failed_download_still_in_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = HarvestPipeline::new(
            MockSource::new(),
            MockFetcher {
                failing: vec!["mock://1:1"],
            },
            "3.1.0",
        )
        .with_output_dir(dir.path());

        let mut diagnostics = Diagnostics::new();
        let err = pipeline.execute(&mut diagnostics).await.unwrap_err();

        assert!(matches!(err, PipelineError::FinishedWithErrors { count: 1 }));
        assert_eq!(diagnostics.count(Severity::Error), 1);
        assert!(!dir.path().join("home.svg").exists());
        assert!(dir.path().join("arrow-2-left.svg").exists());

        let manifest = Manifest::read(&dir.path().join(MANIFEST_FILE_NAME)).unwrap();
        assert_eq!(manifest.pictograms.len(), 2);
        assert_eq!(manifest.pictograms[0].name, "home");
    }

    #[tokio::test]
    async fn test_unwritable_name_does_not_stop_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource {
            page: vec!["Transport/Train", "Bus"],
            ..MockSource::new()
        };
        let pipeline = HarvestPipeline::new(source, MockFetcher { failing: vec![] }, "3.1.0")
            .with_output_dir(dir.path());

        let mut diagnostics = Diagnostics::new();
        let err = pipeline.execute(&mut diagnostics).await.unwrap_err();

        assert!(matches!(err, PipelineError::FinishedWithErrors { .. }));
        assert_eq!(diagnostics.count(Severity::Error), 1);
        assert!(dir.path().join("bus.svg").exists());
        assert!(!dir.path().join("transport").exists());

        let manifest = Manifest::read(&dir.path().join(MANIFEST_FILE_NAME)).unwrap();
        let names: Vec<&str> = manifest.pictograms.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["transport/train", "bus"]);
    }

    #[tokio::test]
    async fn test_unrendered_pictogram_excluded_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource {
            unrendered: vec!["1:3"],
            ..MockSource::new()
        };
        let pipeline = HarvestPipeline::new(source, MockFetcher { failing: vec![] }, "3.1.0")
            .with_output_dir(dir.path());

        let mut diagnostics = Diagnostics::new();
        let result = pipeline.execute(&mut diagnostics).await.unwrap();

        assert_eq!(result.stats.invalid, 1);
        assert_eq!(result.manifest.pictograms.len(), 1);
        assert_eq!(result.manifest.pictograms[0].name, "home");
        assert_eq!(result.manifest.pictograms[0].tags, vec!["house", "Pictograms", "Home"]);
        assert!(result.manifest.pictograms[0].color);
    }

    #[tokio::test]
    async fn test_document_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource {
            fail_file: true,
            ..MockSource::new()
        };
        let pipeline = HarvestPipeline::new(source, MockFetcher { failing: vec![] }, "3.1.0")
            .with_output_dir(dir.path().join("out"));

        let mut diagnostics = Diagnostics::new();
        let err = pipeline.execute(&mut diagnostics).await.unwrap_err();

        assert!(matches!(err, PipelineError::DocumentFetch(_)));
        assert!(!pipeline.output_dir().exists());
    }

    #[tokio::test]
    async fn test_batch_failure_writes_no_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource {
            fail_images: true,
            ..MockSource::new()
        };
        let pipeline = HarvestPipeline::new(source, MockFetcher { failing: vec![] }, "3.1.0")
            .with_output_dir(dir.path());

        let mut diagnostics = Diagnostics::new();
        let err = pipeline.execute(&mut diagnostics).await.unwrap_err();

        assert!(matches!(err, PipelineError::UrlResolution(_)));
        assert!(!dir.path().join(MANIFEST_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_pipeline_with_custom_batch_size() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = HarvestPipeline::new(MockSource::new(), MockFetcher { failing: vec![] }, "1.0.0")
            .with_batch_size(1)
            .with_output_dir(dir.path());

        let mut diagnostics = Diagnostics::new();
        pipeline.execute(&mut diagnostics).await.unwrap();

        assert_eq!(pipeline.source.image_requests.load(Ordering::SeqCst), 2);
    }
}
