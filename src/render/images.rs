//! Image loading for logos.
//!
//! A logo reference is one of:
//!
//! - a `data:` URL (what the designer produces after an upload)
//! - an `http(s)://` URL, downloaded with the shared HTTP client
//! - a filesystem path
//!
//! The most recently decoded image is kept, keyed by its reference, so a
//! batch export fetches its logo once. Replacing the logo evicts the old
//! one. Every load is bounded by a timeout; callers that can degrade
//! use [`ImageLoader::try_load`], which logs and returns `None` on failure.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::CarnetError;

/// Default bound on a single image load.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

struct CachedImage {
    source: String,
    image: Arc<RgbaImage>,
}

pub struct ImageLoader {
    http_client: reqwest::Client,
    timeout: Duration,
    cache: RwLock<Option<CachedImage>>,
}

impl ImageLoader {
    pub fn new(timeout: Duration) -> Result<Self, CarnetError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("carnet/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CarnetError::Image(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            http_client,
            timeout,
            cache: RwLock::new(None),
        })
    }

    /// Load and decode an image, using the cache when possible.
    pub async fn load(&self, source: &str) -> Result<Arc<RgbaImage>, CarnetError> {
        if let Some(cached) = self.cache.read().await.as_ref()
            && cached.source == source
        {
            return Ok(cached.image.clone());
        }

        let bytes = tokio::time::timeout(self.timeout, self.fetch_bytes(source))
            .await
            .map_err(|_| {
                CarnetError::Image(format!(
                    "Timed out after {:?} loading {}",
                    self.timeout,
                    describe(source)
                ))
            })??;

        let decode = move || image::load_from_memory(&bytes).map(|img| img.to_rgba8());
        let image = tokio::task::spawn_blocking(decode)
            .await
            .map_err(|e| CarnetError::Image(format!("Decode task failed: {}", e)))?
            .map_err(|e| CarnetError::Image(format!("Failed to decode image: {}", e)))?;
        let image = Arc::new(image);

        *self.cache.write().await = Some(CachedImage {
            source: source.to_string(),
            image: image.clone(),
        });
        Ok(image)
    }

    /// Like [`load`](Self::load), but a failure is logged and skipped.
    pub async fn try_load(&self, source: &str) -> Option<Arc<RgbaImage>> {
        match self.load(source).await {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(source = %describe(source), error = %e, "Skipping image");
                None
            }
        }
    }

    async fn fetch_bytes(&self, source: &str) -> Result<Vec<u8>, CarnetError> {
        if source.starts_with("data:") {
            return decode_data_url(source);
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            let response = self
                .http_client
                .get(source)
                .send()
                .await
                .map_err(|e| CarnetError::Image(format!("Failed to download {}: {}", source, e)))?;
            if !response.status().is_success() {
                return Err(CarnetError::Image(format!(
                    "Failed to download {}: HTTP {}",
                    source,
                    response.status()
                )));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| CarnetError::Image(format!("Failed to read image data: {}", e)))?;
            return Ok(bytes.to_vec());
        }

        Ok(tokio::fs::read(source).await?)
    }
}

/// Short form of an image reference for logs; data URLs can be megabytes.
fn describe(source: &str) -> String {
    if source.starts_with("data:") {
        let header = source.split(',').next().unwrap_or("data:");
        format!("{},… ({} bytes)", header, source.len())
    } else {
        source.to_string()
    }
}

/// Decode the payload of a `data:` URL.
///
/// Supports `;base64` payloads and plain percent-encoded payloads.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, CarnetError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| CarnetError::Image("Not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CarnetError::Image("Malformed data URL: missing ','".to_string()))?;

    if header.split(';').any(|param| param.eq_ignore_ascii_case("base64")) {
        BASE64
            .decode(payload.trim())
            .map_err(|e| CarnetError::Image(format!("Invalid base64 in data URL: {}", e)))
    } else {
        Ok(percent_decode(payload))
    }
}

/// Build a `data:` URL for `bytes`.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let Some(byte) = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        {
            out.push(byte);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}
