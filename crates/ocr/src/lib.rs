pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod store;

pub use extract::{NutrientExtractor, NutrientPattern, PATTERNS};
pub use pipeline::{LabelAnalysis, LabelPipeline, PipelineError};
pub use preprocess::{prepare_label_image, PreprocessError, PreprocessOptions};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, TesseractCli};
pub use store::{upload_extension, StoreError, StoredUpload, UploadStore};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;

/// Pull nutrient values out of OCR text; see [`NutrientExtractor::extract`].
pub fn extract_nutrients(text: &str) -> nutriscan_core::NutrientReading {
    NutrientExtractor::extract(text)
}
