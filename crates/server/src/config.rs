use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use nutriscan_ocr::{MockRecognizer, OcrBackend, PreprocessOptions, TesseractCli};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
    #[error("OCR backend '{0}' is not compiled in (rebuild with the `tesseract` feature)")]
    BackendUnavailable(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OcrBackendKind {
    #[default]
    TesseractCli,
    Tesseract,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig {
    pub backend: OcrBackendKind,
    /// Path or name of the `tesseract` executable.
    pub tesseract_cmd: PathBuf,
    pub lang: String,
    /// tessdata directory, for the in-process backend.
    pub data_path: Option<String>,
    /// Text returned by the mock backend.
    pub mock_text: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::default(),
            tesseract_cmd: PathBuf::from("tesseract"),
            lang: "eng".to_string(),
            data_path: None,
            mock_text: String::new(),
        }
    }
}

impl OcrConfig {
    pub fn build_backend(&self) -> Result<Box<dyn OcrBackend>, ConfigError> {
        match self.backend {
            OcrBackendKind::TesseractCli => {
                Ok(Box::new(TesseractCli::new(&self.tesseract_cmd, &self.lang)))
            }
            OcrBackendKind::Mock => Ok(Box::new(MockRecognizer::new(&self.mock_text))),
            #[cfg(feature = "tesseract")]
            OcrBackendKind::Tesseract => Ok(Box::new(nutriscan_ocr::TesseractRecognizer::new(
                self.data_path.clone(),
                &self.lang,
            ))),
            #[cfg(not(feature = "tesseract"))]
            OcrBackendKind::Tesseract => Err(ConfigError::BackendUnavailable("tesseract")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Directory uploaded label images are kept in.
    pub upload_dir: PathBuf,
    pub store_uploads: bool,
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
    pub ocr: OcrConfig,
    pub preprocess: PreprocessOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            upload_dir: PathBuf::from("uploads"),
            store_uploads: true,
            max_upload_bytes: 10 * 1024 * 1024,
            log_format: LogFormat::default(),
            ocr: OcrConfig::default(),
            preprocess: PreprocessOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read `path` if given (defaults otherwise), then apply environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("NUTRISCAN_BIND") {
            self.bind = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "NUTRISCAN_BIND",
                value,
            })?;
        }
        if let Some(value) = lookup("NUTRISCAN_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("NUTRISCAN_TESSERACT_CMD") {
            self.ocr.tesseract_cmd = PathBuf::from(value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_listen_on_5000_with_10mib_limit() {
        let c = ServerConfig::default();
        assert_eq!(c.bind.port(), 5000);
        assert_eq!(c.max_upload_bytes, 10_485_760);
        assert!(c.store_uploads);
        assert_eq!(c.ocr.backend, OcrBackendKind::TesseractCli);
        assert_eq!(c.ocr.lang, "eng");
    }

    #[test]
    fn parse_full_file() {
        let c = ServerConfig::from_toml(
            r#"
            bind = "127.0.0.1:8080"
            upload_dir = "/var/lib/nutriscan"
            store_uploads = false
            max_upload_bytes = 1024
            log_format = "json"

            [ocr]
            backend = "mock"
            mock_text = "Protein 9"

            [preprocess]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(c.bind, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert!(!c.store_uploads);
        assert_eq!(c.log_format, LogFormat::Json);
        assert_eq!(c.ocr.backend, OcrBackendKind::Mock);
        assert_eq!(c.ocr.tesseract_cmd, PathBuf::from("tesseract"));
        assert!(!c.preprocess.enabled);
        assert_eq!(c.preprocess.max_dimension, 2800);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let c = ServerConfig::from_toml("").unwrap();
        assert_eq!(c.bind, ServerConfig::default().bind);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            ServerConfig::from_toml("bnid = \"0.0.0.0:1\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(ServerConfig::from_toml("[ocr]\nlanguage = \"deu\"").is_err());
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("NUTRISCAN_BIND", "127.0.0.1:9000"),
            ("NUTRISCAN_TESSERACT_CMD", r"C:\Program Files\Tesseract-OCR\tesseract.exe"),
        ]
        .into_iter()
        .collect();
        let mut c = ServerConfig::default();
        c.apply_overrides(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(c.bind.port(), 9000);
        assert_eq!(
            c.ocr.tesseract_cmd,
            PathBuf::from(r"C:\Program Files\Tesseract-OCR\tesseract.exe")
        );
        assert_eq!(c.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn bad_bind_override_is_an_error() {
        let mut c = ServerConfig::default();
        let err = c
            .apply_overrides(|k| (k == "NUTRISCAN_BIND").then(|| "not-an-addr".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "NUTRISCAN_BIND", .. }));
    }

    #[test]
    fn mock_backend_is_built() {
        let ocr = OcrConfig {
            backend: OcrBackendKind::Mock,
            mock_text: "Sugar 3".into(),
            ..Default::default()
        };
        let backend = ocr.build_backend().unwrap();
        assert_eq!(backend.name(), "mock");
        assert_eq!(backend.recognize(b"").unwrap(), "Sugar 3");
    }
}
