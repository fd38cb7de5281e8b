use std::sync::Arc;

use nutriscan_core::{NutriScoreCalculator, NutrientError, NutrientField, NutrientReading, ScoreResult};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::extract::NutrientExtractor;
use crate::preprocess::{self, PreprocessError, PreprocessOptions};
use crate::recognizer::{OcrBackend, OcrError};
use crate::store::{StoreError, StoredUpload, UploadStore};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("OCR task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Everything learned from one label photo.
#[derive(Debug, Clone, Serialize)]
pub struct LabelAnalysis {
    pub ocr_text: String,
    pub nutrients: NutrientReading,
    pub missing: Vec<NutrientField>,
    /// `None` when no nutrient could be read or the reading was rejected.
    pub score: Option<ScoreResult>,
    /// Why the extracted values could not be scored.
    #[serde(serialize_with = "display_error")]
    pub score_error: Option<NutrientError>,
    pub upload: Option<StoredUpload>,
}

fn display_error<S: Serializer>(error: &Option<NutrientError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.collect_str(e),
        None => s.serialize_none(),
    }
}

impl LabelAnalysis {
    /// Extract and score already-recognized text. A rejected reading keeps
    /// the text and the extracted values and records the rejection.
    pub fn from_text(ocr_text: String) -> Self {
        let nutrients = NutrientExtractor::extract(&ocr_text);
        let (score, score_error) = if nutrients.is_empty() {
            (None, None)
        } else {
            match NutriScoreCalculator::score(&nutrients) {
                Ok(score) => (Some(score), None),
                Err(e) => (None, Some(e)),
            }
        };
        Self {
            missing: nutrients.missing(),
            ocr_text,
            nutrients,
            score,
            score_error,
            upload: None,
        }
    }
}

/// Orchestrates: store upload → preprocess → OCR → extract → score.
pub struct LabelPipeline<R: OcrBackend> {
    recognizer: Arc<R>,
    store: Option<UploadStore>,
    preprocess: PreprocessOptions,
}

impl<R: OcrBackend + 'static> LabelPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            store: None,
            preprocess: PreprocessOptions::default(),
        }
    }

    /// Keep a copy of every processed upload under `store`.
    pub fn with_store(mut self, store: UploadStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_preprocess(mut self, opts: PreprocessOptions) -> Self {
        self.preprocess = opts;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Process the raw bytes of an uploaded image. `ext` is the sanitized
    /// extension used when the upload is stored.
    pub async fn process_bytes(&self, data: &[u8], ext: &str) -> Result<LabelAnalysis, PipelineError> {
        let upload = match &self.store {
            Some(store) => Some(store.save(data, ext).await?),
            None => None,
        };

        let ocr_text = self.recognize(data.to_vec()).await?;
        tracing::debug!(chars = ocr_text.len(), backend = self.backend_name(), "OCR finished");

        let mut analysis = LabelAnalysis::from_text(ocr_text);
        analysis.upload = upload;

        if let Some(e) = &analysis.score_error {
            tracing::warn!(error = %e, "Extracted values rejected");
        }

        tracing::info!(
            found = analysis.nutrients.len(),
            missing = analysis.missing.len(),
            grade = %analysis.score.map_or('-', |s| s.grade.letter()),
            "Label analyzed"
        );
        Ok(analysis)
    }

    /// Preprocessing and recognition are CPU-bound or shell out, so they run
    /// on the blocking pool.
    async fn recognize(&self, data: Vec<u8>) -> Result<String, PipelineError> {
        let recognizer = Arc::clone(&self.recognizer);
        let opts = self.preprocess.clone();
        tokio::task::spawn_blocking(move || -> Result<String, PipelineError> {
            let image = preprocess::prepare_label_image(&data, &opts)?;
            Ok(recognizer.recognize(&image)?)
        })
        .await?
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
