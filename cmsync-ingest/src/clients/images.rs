//! Image reference resolution
//!
//! CMS image fields carry an asset reference such as
//! `image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg`. The resolver turns it into
//! a public CDN URL without any network access.

use serde_json::Value;

/// Encoding requested from the image CDN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Webp,
    Png,
}

impl ImageFormat {
    fn as_param(self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Png => "png",
        }
    }
}

/// Turns an opaque image reference into a public URL
pub trait ImageUrlResolver: Send + Sync {
    /// `None` when no usable reference is present
    fn resolve(&self, image: &Value, format: Option<ImageFormat>) -> Option<String>;
}

/// Resolver for the Sanity image CDN
#[derive(Debug, Clone)]
pub struct SanityImageResolver {
    base_url: String,
    project_id: String,
    dataset: String,
}

impl SanityImageResolver {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        dataset: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }
}

/// Pull the asset reference out of the shapes the CMS uses for images
fn asset_reference(image: &Value) -> Option<&str> {
    match image {
        Value::String(reference) => Some(reference.as_str()),
        Value::Object(map) => map
            .get("asset")
            .and_then(|asset| asset.get("_ref").or_else(|| asset.get("_id")))
            .or_else(|| map.get("_ref"))
            .and_then(Value::as_str),
        _ => None,
    }
}

/// Split `image-<assetId>-<w>x<h>-<ext>` into (`<assetId>-<w>x<h>`, ext)
fn parse_asset_reference(reference: &str) -> Option<(String, &str)> {
    let rest = reference.strip_prefix("image-")?;
    let mut parts: Vec<&str> = rest.split('-').collect();
    if parts.len() < 3 {
        return None;
    }

    let extension = parts.pop()?;
    let dimensions = parts.pop()?;
    let asset_id = parts.join("-");

    let (width, height) = dimensions.split_once('x')?;
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if asset_id.is_empty() || extension.is_empty() || !numeric(width) || !numeric(height) {
        return None;
    }

    Some((format!("{}-{}", asset_id, dimensions), extension))
}

impl ImageUrlResolver for SanityImageResolver {
    fn resolve(&self, image: &Value, format: Option<ImageFormat>) -> Option<String> {
        let reference = asset_reference(image)?;

        // Already a URL: nothing to build
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Some(reference.to_string());
        }

        let Some((file_stem, extension)) = parse_asset_reference(reference) else {
            tracing::warn!(reference, "Malformed image reference, leaving image URL unset");
            return None;
        };

        let mut url = format!(
            "{}/images/{}/{}/{}.{}",
            self.base_url, self.project_id, self.dataset, file_stem, extension
        );
        if let Some(format) = format {
            url.push_str("?fm=");
            url.push_str(format.as_param());
        }
        Some(url)
    }
}
