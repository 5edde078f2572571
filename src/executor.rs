use crate::harvest::minify::{mark_color_immutable, minify_svg};
use crate::harvest::traits::{Candidate, Diagnostics};
use crate::traits::AssetFetcher;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, instrument};

/// A progress line is logged after this many downloads.
pub const PROGRESS_INTERVAL: usize = 50;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadStats {
    pub attempted: usize,
    pub written: usize,
    pub failed_downloads: usize,
    pub failed_minifications: usize,
    pub failed_writes: usize,
}

/// Downloads, minifies and writes pictograms one after another.
pub struct DownloadExecutor<'a, F: AssetFetcher + ?Sized> {
    fetcher: &'a F,
    output_dir: PathBuf,
}

impl<'a, F: AssetFetcher + ?Sized> DownloadExecutor<'a, F> {
    pub fn new(fetcher: &'a F, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
        }
    }

    /// Processes every valid candidate in order.
    ///
    /// Failed downloads and writes are recorded as errors and failed
    /// minifications as warnings; none of them stops the loop. A file name
    /// that would leave the output directory is rejected before download.
    /// Only a failure to create the output directory is returned as `Err`.
    #[instrument(skip_all, fields(pictograms = candidates.len(), output = %self.output_dir.display()))]
    pub async fn execute(
        &self,
        candidates: &[Candidate],
        diagnostics: &mut Diagnostics,
    ) -> Result<DownloadStats, std::io::Error> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        info!("Starting svg download");
        let mut stats = DownloadStats::default();

        for candidate in candidates.iter().filter(|c| c.is_valid()) {
            if !is_plain_file_name(&candidate.file_name) {
                stats.failed_writes += 1;
                diagnostics.error(format!(
                    "Invalid file name for pictogram {}: {}",
                    candidate.id, candidate.file_name
                ));
            } else if let Some(svg) = self.process(candidate, &mut stats, diagnostics).await {
                let path = self.output_dir.join(&candidate.file_name);
                match tokio::fs::write(&path, svg).await {
                    Ok(()) => stats.written += 1,
                    Err(e) => {
                        stats.failed_writes += 1;
                        diagnostics.error(format!(
                            "Failed to write pictogram {}: {e}",
                            candidate.file_name
                        ));
                    }
                }
            }

            stats.attempted += 1;
            if stats.attempted % PROGRESS_INTERVAL == 0 {
                info!("Finished {} svg downloads", stats.attempted);
            }
        }

        info!(
            written = stats.written,
            failed = stats.failed_downloads + stats.failed_minifications + stats.failed_writes,
            "Finished all svg downloads"
        );
        Ok(stats)
    }

    /// Returns the final file content, or `None` when the pictogram is skipped.
    async fn process(
        &self,
        candidate: &Candidate,
        stats: &mut DownloadStats,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let url = candidate.url.as_deref()?;

        let content = match self.fetcher.fetch(url).await {
            Ok(asset) if asset.is_success() => asset.body,
            Ok(asset) => {
                debug!(status = asset.status, file = %candidate.file_name, "Download rejected");
                stats.failed_downloads += 1;
                diagnostics.error(format!(
                    "Failed to download pictogram for {}",
                    candidate.file_name
                ));
                return None;
            }
            Err(e) => {
                debug!(error = %e, file = %candidate.file_name, "Download failed");
                stats.failed_downloads += 1;
                diagnostics.error(format!(
                    "Failed to download pictogram for {}",
                    candidate.file_name
                ));
                return None;
            }
        };

        let svg = match minify_svg(&content) {
            Ok(svg) => svg,
            Err(e) => {
                stats.failed_minifications += 1;
                diagnostics.warn(format!(
                    "Failed to minify pictogram {} due to {}",
                    candidate.file_name, e
                ));
                return None;
            }
        };

        if candidate.description.is_color() {
            Some(svg)
        } else {
            Some(mark_color_immutable(&svg))
        }
    }
}

/// A file name is written only if it names a single entry directly inside
/// the output directory.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
