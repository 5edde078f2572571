//! Batched render URL resolution.
//!
//! Candidates are sent to the document service in fixed-size chunks, one
//! request at a time. Every candidate is recorded in a single identity-keyed
//! [`CandidateMap`] owned by the batching loop, which collects the URLs the
//! service returns.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::harvest::traits::{Candidate, Diagnostics};
use crate::traits::{DocumentSource, SourceError};

/// Number of node ids sent per render URL request.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// A render URL request was rejected; no partial result is usable.
#[derive(Error, Debug)]
#[error("Render URL request for batch {batch} failed: {source}")]
pub struct BatchError {
    /// Zero-based index of the failing chunk
    pub batch: usize,
    #[source]
    pub source: SourceError,
}

/// Candidates keyed by node id, in first-insertion order.
#[derive(Debug, Default)]
pub struct CandidateMap {
    entries: IndexMap<String, Candidate>,
}

impl CandidateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `candidate`, replacing (and warning about) an earlier one with
    /// the same id. A replaced entry keeps its original position.
    pub fn insert(&mut self, candidate: Candidate, diagnostics: &mut Diagnostics) {
        if self.entries.contains_key(&candidate.id) {
            diagnostics.warn(format!(
                "Duplicate pictogram id {} ({})",
                candidate.id, candidate.file_name
            ));
        }
        self.entries.insert(candidate.id.clone(), candidate);
    }

    /// Records the URL returned for `id`; unknown ids are reported and dropped.
    pub fn attach_url(&mut self, id: &str, url: Option<String>, diagnostics: &mut Diagnostics) {
        match self.entries.get_mut(id) {
            Some(candidate) => candidate.url = url,
            None => diagnostics.warn(format!("Received response for unknown pictogram: {id}")),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        self.entries.into_values().collect()
    }
}

/// Resolves render URLs for candidates in sequential fixed-size batches.
pub struct AssetBatcher<'a, S: DocumentSource + ?Sized> {
    source: &'a S,
    batch_size: usize,
}

impl<'a, S: DocumentSource + ?Sized> AssetBatcher<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the chunk size. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Resolves URLs for every candidate and returns all of them, valid or
    /// not, in map-insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] as soon as one chunk request fails; later
    /// chunks are not requested.
    #[instrument(skip_all, fields(candidates = candidates.len(), batch_size = self.batch_size))]
    pub async fn resolve(
        &self,
        candidates: Vec<Candidate>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Candidate>, BatchError> {
        let mut map = CandidateMap::new();
        let mut remaining = candidates.into_iter();
        let mut batch = 0;

        loop {
            let chunk: Vec<Candidate> = remaining.by_ref().take(self.batch_size).collect();
            if chunk.is_empty() {
                break;
            }

            info!(
                from = map.len(),
                to = map.len() + self.batch_size,
                "Starting pictogram url batch request"
            );

            let ids: Vec<String> = chunk.iter().map(|c| c.id.clone()).collect();
            for candidate in chunk {
                map.insert(candidate, diagnostics);
            }

            let response = self
                .source
                .image_urls(&ids)
                .await
                .map_err(|source| BatchError { batch, source })?;

            debug!(batch, urls = response.images.len(), "Batch resolved");
            for (id, url) in response.images {
                map.attach_url(&id, url, diagnostics);
            }

            batch += 1;
        }

        Ok(map.into_candidates())
    }
}
