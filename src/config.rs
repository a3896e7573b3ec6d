//! Configuration types for catalog extraction runs.
//!
//! Two structs, with different lifetimes:
//!
//! * [`ClientConfig`] — the immutable remote-service settings (credential,
//!   endpoint, schema). Built once at startup and handed by reference to
//!   [`crate::pipeline::extract::VisionAgentClient::new`]. Nothing reads the
//!   credential from the environment after that point.
//! * [`PipelineConfig`] — everything about one run (worker budget, output
//!   location) plus the injection points for the splitter, extractor and
//!   progress callback. Built via [`PipelineConfigBuilder`].

use crate::error::CatalogError;
use crate::pipeline::extract::ProductExtractor;
use crate::pipeline::split::DocumentSplitter;
use crate::progress::ProgressCallback;
use crate::schema::product_schema;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the extraction service credential.
pub const API_KEY_ENV: &str = "VISION_AGENT_API_KEY";

/// Default document-analysis endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.va.landing.ai/v1/tools/agentic-document-analysis";

/// Default number of pages extracted at once.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Default parent directory for run output.
pub const DEFAULT_OUTPUT_ROOT: &str = "output";

/// Settings shared read-only by every extraction request.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    endpoint: String,
    schema: Arc<Value>,
}

impl ClientConfig {
    /// Create a config for `api_key` with the default endpoint and schema.
    ///
    /// # Errors
    /// [`CatalogError::ConfigMissing`] if the key is empty or whitespace.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CatalogError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(missing_api_key());
        }
        Ok(Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            schema: product_schema(),
        })
    }

    /// Read the credential from `VISION_AGENT_API_KEY`.
    pub fn from_env() -> Result<Self, CatalogError> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) => Self::new(key),
            Err(_) => Err(missing_api_key()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Replace the product schema, e.g. for a differently shaped catalog.
    pub fn with_schema(mut self, schema: Arc<Value>) -> Self {
        self.schema = schema;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn schema(&self) -> &Arc<Value> {
        &self.schema
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn missing_api_key() -> CatalogError {
    CatalogError::ConfigMissing {
        key: API_KEY_ENV,
        hint: format!("Set it in the environment, e.g. export {API_KEY_ENV}=..."),
    }
}

/// Configuration for one page-by-page extraction run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use catalog_ocr::{ClientConfig, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .max_workers(2)
///     .output_root("output")
///     .client(ClientConfig::new("secret").unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(config.max_workers, 2);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Pages extracted concurrently. Default: 4.
    ///
    /// `1` processes pages one after another. Each in-flight page holds one
    /// open HTTP request, so raising this mostly trades rate-limit headroom
    /// for wall-clock time.
    pub max_workers: usize,

    /// Parent directory for `<timestamp>[-<name>]` run directories. Default: `output`.
    pub output_root: PathBuf,

    /// Directory for split page files. Default: the system temp dir.
    pub scratch_dir: Option<PathBuf>,

    /// Remote service settings. If None along with `extractor`, read from
    /// the environment.
    pub client: Option<ClientConfig>,

    /// Pre-constructed extractor. Takes precedence over `client`.
    pub extractor: Option<Arc<dyn ProductExtractor>>,

    /// Pre-constructed splitter. Default: pdfium.
    pub splitter: Option<Arc<dyn DocumentSplitter>>,

    /// Per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            scratch_dir: None,
            client: None,
            extractor: None,
            splitter: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("max_workers", &self.max_workers)
            .field("output_root", &self.output_root)
            .field("scratch_dir", &self.scratch_dir)
            .field("client", &self.client)
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn ProductExtractor>"))
            .field("splitter", &self.splitter.as_ref().map(|_| "<dyn DocumentSplitter>"))
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.max_workers = n.max(1);
        self
    }

    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_root = root.into();
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    pub fn client(mut self, client: ClientConfig) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn ProductExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn splitter(mut self, splitter: Arc<dyn DocumentSplitter>) -> Self {
        self.config.splitter = Some(splitter);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, CatalogError> {
        let c = &self.config;
        if c.max_workers == 0 {
            return Err(CatalogError::InvalidConfig(
                "max_workers must be ≥ 1".into(),
            ));
        }
        if c.output_root.as_os_str().is_empty() {
            return Err(CatalogError::InvalidConfig(
                "output_root must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
