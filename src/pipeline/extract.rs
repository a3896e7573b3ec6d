//! Extraction client: upload one PDF and get products back.
//!
//! The service takes a multipart POST with the PDF in a `pdf` file field and
//! the JSON Schema in a `fields_schema` text field, and answers with
//! `{"data": {"extracted_schema": {...}}}`.
//!
//! One request per call. There is no retry, no backoff and no client-side
//! timeout beyond reqwest's defaults; a failed request is reported once as
//! an [`ExtractionError`] and the caller decides what that means.

use crate::config::ClientConfig;
use crate::error::{CatalogError, ExtractionError};
use crate::schema::ProductExtraction;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Turns a PDF document into product records.
///
/// Implementations are shared across concurrently running page futures, so
/// they must be `Send + Sync` and keep no per-call state in `self`.
#[async_trait]
pub trait ProductExtractor: Send + Sync {
    /// Extract products from the PDF at `document`.
    ///
    /// `page` is the 1-based page hint used in error messages when the
    /// document is a split page.
    async fn extract(
        &self,
        document: &Path,
        page: Option<usize>,
    ) -> Result<ProductExtraction, ExtractionError>;
}

/// HTTP client for the agentic document-analysis endpoint.
#[derive(Debug, Clone)]
pub struct VisionAgentClient {
    http: reqwest::Client,
    endpoint: String,
    authorization: String,
    schema_json: Arc<str>,
}

impl VisionAgentClient {
    /// Build a client from startup configuration.
    ///
    /// The schema is serialised once here and reused by every request.
    pub fn new(config: &ClientConfig) -> Result<Self, CatalogError> {
        let schema_json = serde_json::to_string(config.schema().as_ref())
            .map_err(|e| CatalogError::InvalidConfig(format!("schema is not serialisable: {e}")))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| CatalogError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint().to_string(),
            authorization: format!("Basic {}", config.api_key()),
            schema_json: Arc::from(schema_json),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ProductExtractor for VisionAgentClient {
    async fn extract(
        &self,
        document: &Path,
        page: Option<usize>,
    ) -> Result<ProductExtraction, ExtractionError> {
        let start = Instant::now();

        let bytes = tokio::fs::read(document)
            .await
            .map_err(|e| ExtractionError::DocumentUnreadable {
                path: document.to_path_buf(),
                detail: e.to_string(),
            })?;
        let file_name = document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let size = bytes.len();

        let transport = |detail: String| ExtractionError::Transport { page, detail };

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| transport(e.to_string()))?;
        let form = Form::new()
            .part("pdf", part)
            .text("fields_schema", self.schema_json.to_string());

        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, &self.authorization)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport(e.to_string()))?;

        debug!(
            "Page {:?}: {} bytes uploaded, HTTP {} in {:?}",
            page,
            size,
            status,
            start.elapsed()
        );

        check_status(status, &body, page)?;
        parse_envelope(&body, page)
    }
}

/// Map a non-success status to the matching error kind.
fn check_status(status: StatusCode, body: &str, page: Option<usize>) -> Result<(), ExtractionError> {
    if status.is_success() {
        return Ok(());
    }

    let detail = format!("HTTP {}: {}", status, truncate(body, 200));
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ExtractionError::Auth {
            page,
            status: status.as_u16(),
            detail,
        });
    }
    Err(ExtractionError::Transport { page, detail })
}

/// Unwrap `data.extracted_schema` from a response body.
///
/// Invalid JSON is a [`ExtractionError::Decode`]; valid JSON without the
/// expected keys, or whose `extracted_schema` does not match the product
/// shape, is a [`ExtractionError::ResponseFormat`].
pub fn parse_envelope(body: &str, page: Option<usize>) -> Result<ProductExtraction, ExtractionError> {
    let envelope: Value = serde_json::from_str(body).map_err(|e| ExtractionError::Decode {
        page,
        detail: e.to_string(),
    })?;

    let format_error = |detail: String| ExtractionError::ResponseFormat { page, detail };

    let data = envelope
        .get("data")
        .ok_or_else(|| format_error("missing key 'data'".to_string()))?;
    let extracted = data
        .get("extracted_schema")
        .ok_or_else(|| format_error("missing key 'data.extracted_schema'".to_string()))?;

    serde_json::from_value(extracted.clone())
        .map_err(|e| format_error(format!("extracted_schema: {e}")))
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENVELOPE: &str = r#"{
        "data": {
            "markdown": "…",
            "extracted_schema": {
                "products": [{
                    "id": "197766S",
                    "name": "Petal Palooza",
                    "size": "S",
                    "price": 39.99,
                    "flower-data": "2 stems Hydrangea - Blue, 4 stems Carnation - Orange",
                    "foliage-data": "3 stems Tree Fern - Painted",
                    "dimensions": "Arrangement Height 11\", Length 10\"",
                    "construction-material": "6\" gathering vase - clear"
                }]
            }
        }
    }"#;

    #[test]
    fn parses_products_from_envelope() {
        let extraction = parse_envelope(ENVELOPE, Some(1)).unwrap();
        assert_eq!(extraction.products.len(), 1);
        assert_eq!(extraction.products[0].id, "197766S");
        assert_eq!(extraction.products[0].price, 39.99);
    }

    #[test]
    fn empty_product_list_is_success() {
        let body = r#"{"data": {"extracted_schema": {"products": []}}}"#;
        assert!(parse_envelope(body, None).unwrap().products.is_empty());
    }

    #[test]
    fn invalid_json_is_decode_error() {
        let err = parse_envelope("<html>502 Bad Gateway</html>", Some(4)).unwrap_err();
        assert!(matches!(err, ExtractionError::Decode { page: Some(4), .. }));
    }

    #[test]
    fn missing_data_is_format_error() {
        let err = parse_envelope(r#"{"errors": ["quota"]}"#, Some(2)).unwrap_err();
        match err {
            ExtractionError::ResponseFormat { page, detail } => {
                assert_eq!(page, Some(2));
                assert!(detail.contains("'data'"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_extracted_schema_is_format_error() {
        let err = parse_envelope(r#"{"data": {"markdown": "x"}}"#, None).unwrap_err();
        assert!(matches!(err, ExtractionError::ResponseFormat { .. }));
        assert!(err.to_string().contains("extracted_schema"));
    }

    #[test]
    fn wrong_product_shape_is_format_error() {
        let body = r#"{"data": {"extracted_schema": {"products": [{"id": "1S"}]}}}"#;
        let err = parse_envelope(body, None).unwrap_err();
        assert!(matches!(err, ExtractionError::ResponseFormat { .. }));
    }

    #[test]
    fn unauthorized_status_is_auth_error() {
        let err = check_status(StatusCode::UNAUTHORIZED, "bad key", Some(1)).unwrap_err();
        assert!(matches!(err, ExtractionError::Auth { status: 401, .. }));
    }

    #[test]
    fn server_error_status_is_transport_error() {
        let err = check_status(StatusCode::BAD_GATEWAY, "upstream", Some(3)).unwrap_err();
        match err {
            ExtractionError::Transport { page, detail } => {
                assert_eq!(page, Some(3));
                assert!(detail.contains("502"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(check_status(StatusCode::OK, "", None).is_ok());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé\u{2026}");
    }

    #[test]
    fn client_serialises_schema_once() {
        let config = ClientConfig::new("key").unwrap();
        let client = VisionAgentClient::new(&config).unwrap();
        assert!(client.schema_json.contains("\"products\""));
        assert_eq!(client.authorization, "Basic key");
        assert_eq!(client.endpoint(), crate::config::DEFAULT_ENDPOINT);
    }

    #[tokio::test]
    async fn unreadable_document_is_reported() {
        let config = ClientConfig::new("key").unwrap();
        let client = VisionAgentClient::new(&config).unwrap();
        let err = client
            .extract(Path::new("/definitely/not/here.pdf"), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::DocumentUnreadable { .. }));
    }

    #[test]
    fn custom_schema_replaces_product_schema() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "skus": { "type": "array" } }
        });
        let config = ClientConfig::new("key")
            .unwrap()
            .with_schema(Arc::new(schema));
        let client = VisionAgentClient::new(&config).unwrap();
        assert!(client.schema_json.contains("\"skus\""));
        assert!(!client.schema_json.contains("\"products\""));
    }

    // ── Local HTTP server ───────────────────────────────────────────────────

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one request with `status` and `body`; yields the raw request.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!(
            "http://{}/v1/tools/agentic-document-analysis",
            listener.local_addr().unwrap()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 8192];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (endpoint, handle)
    }

    /// Headers read and, if present, `Content-Length` bytes of body.
    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let headers = text[..header_end].to_ascii_lowercase();
        let length = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        match length {
            Some(len) => request.len() >= header_end + 4 + len,
            None => text.trim_end().ends_with("--"),
        }
    }

    fn page_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("page-007.pdf");
        std::fs::write(&path, b"%PDF-1.4 single page").unwrap();
        path
    }

    #[tokio::test]
    async fn uploads_pdf_and_schema_with_basic_auth() {
        let (endpoint, server) = serve_once("200 OK", r#"{"data": {"extracted_schema": {"products": [{
            "id": "204411L", "name": "Garden Party", "size": "L", "price": 89.99,
            "flower-data": "6 stems Peony", "foliage-data": "4 stems Myrtle",
            "dimensions": "Height 18\"", "construction-material": "Ceramic urn"
        }]}}}"#)
        .await;
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::new("test-key").unwrap().with_endpoint(endpoint);
        let client = VisionAgentClient::new(&config).unwrap();

        let extraction = client.extract(&page_file(dir.path()), Some(7)).await.unwrap();
        assert_eq!(extraction.products.len(), 1);
        assert_eq!(extraction.products[0].id, "204411L");

        let request = server.await.unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /v1/tools/agentic-document-analysis "));
        assert!(lower.contains("authorization: basic test-key\r\n"));
        assert!(lower.contains("content-type: multipart/form-data; boundary="));
        assert!(request.contains(r#"name="pdf"; filename="page-007.pdf""#));
        assert!(lower.contains("content-type: application/pdf"));
        assert!(request.contains("%PDF-1.4 single page"));
        assert!(request.contains(r#"name="fields_schema""#));
        assert!(request.contains(&*client.schema_json));
    }

    #[tokio::test]
    async fn rejected_credential_over_http_is_auth_error() {
        let (endpoint, server) = serve_once("401 Unauthorized", r#"{"detail": "bad key"}"#).await;
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::new("wrong").unwrap().with_endpoint(endpoint);
        let client = VisionAgentClient::new(&config).unwrap();

        let err = client.extract(&page_file(dir.path()), Some(2)).await.unwrap_err();
        assert!(
            matches!(err, ExtractionError::Auth { page: Some(2), status: 401, .. }),
            "got {err:?}"
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn missing_envelope_over_http_is_format_error() {
        let (endpoint, server) = serve_once("200 OK", r#"{"data": {"markdown": "no schema"}}"#).await;
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::new("key").unwrap().with_endpoint(endpoint);
        let client = VisionAgentClient::new(&config).unwrap();

        let err = client.extract(&page_file(dir.path()), Some(5)).await.unwrap_err();
        assert!(
            matches!(err, ExtractionError::ResponseFormat { page: Some(5), .. }),
            "got {err:?}"
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error_with_page() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::new("key")
            .unwrap()
            .with_endpoint(format!("http://{addr}/extract"));
        let client = VisionAgentClient::new(&config).unwrap();

        let err = client.extract(&page_file(dir.path()), Some(7)).await.unwrap_err();
        assert!(
            matches!(err, ExtractionError::Transport { page: Some(7), .. }),
            "got {err:?}"
        );
        assert!(err.to_string().contains("for page 7"));
    }
}
