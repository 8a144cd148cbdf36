//! Image path resolution and loading.
//!
//! Images referenced by a document are fetched through an [`ImageSource`].
//! The default [`FileSource`] reads local files and base64 `data:` URIs;
//! remote URLs need a source supplied by the host.

mod loader;

pub use loader::ImageLoader;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use thiserror::Error;

/// Default time allowed for a single load.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image load timeout after {0}ms")]
    Timeout(u128),
    #[error("Image load failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image load failed: invalid data URI")]
    InvalidDataUri,
    #[error("Image load failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Image load failed: no source for {0}")]
    Unsupported(String),
    #[error("Image load failed")]
    Aborted,
}

/// Outcome of one load. Failures carry `loaded: false` and an error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedImage {
    /// Resolved source.
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoadedImage {
    pub fn success(src: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            src: src.into(),
            width,
            height,
            loaded: true,
            error: None,
        }
    }

    pub fn failure(src: impl Into<String>, error: &ImageError) -> Self {
        Self {
            src: src.into(),
            width: 0,
            height: 0,
            loaded: false,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub timeout: Duration,
    /// Directory (or URL prefix) that relative sources resolve against.
    pub base_path: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            base_path: None,
        }
    }
}

/// Fetches an image and reports its pixel dimensions.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, resolved: &str) -> Result<(u32, u32), ImageError>;
}

/// Local files and base64 `data:` URIs, decoded with the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl ImageSource for FileSource {
    fn fetch(&self, resolved: &str) -> Result<(u32, u32), ImageError> {
        if let Some(uri) = resolved.strip_prefix("data:") {
            let bytes = decode_data_uri(uri)?;
            let img = image::load_from_memory(&bytes)?;
            return Ok((img.width(), img.height()));
        }
        if is_remote(resolved) {
            return Err(ImageError::Unsupported(resolved.to_string()));
        }
        Ok(image::image_dimensions(resolved)?)
    }
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ImageError> {
    let (meta, payload) = uri.split_once(',').ok_or(ImageError::InvalidDataUri)?;
    if !meta.ends_with(";base64") {
        return Err(ImageError::InvalidDataUri);
    }
    Ok(STANDARD.decode(payload.trim())?)
}

fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// True unless the source is a remote URL or a data URI.
pub fn is_local(src: &str) -> bool {
    !is_remote(src) && !src.starts_with("data:")
}

/// Resolve an image source against a base path.
///
/// Data URIs and absolute URLs are returned unchanged. Local paths lose
/// every `..`, `.` and empty segment before being joined to the base with a
/// single `/`, so the result never leaves the base. Without a base path the
/// source is returned unchanged.
pub fn resolve_image_path(src: &str, base_path: Option<&str>) -> String {
    if !is_local(src) {
        return src.to_string();
    }
    let Some(base) = base_path else {
        return src.to_string();
    };
    let sanitized = src
        .split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect::<Vec<_>>()
        .join("/");
    if base.ends_with('/') {
        format!("{base}{sanitized}")
    } else {
        format!("{base}/{sanitized}")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, RgbaImage};

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_resolve_keeps_urls_and_data() {
        assert_eq!(
            resolve_image_path("https://x.dev/a.png", Some("/assets")),
            "https://x.dev/a.png"
        );
        assert_eq!(
            resolve_image_path("data:image/png;base64,AAA", Some("/assets")),
            "data:image/png;base64,AAA"
        );
    }

    #[test]
    fn test_resolve_strips_traversal() {
        assert_eq!(
            resolve_image_path("../../../etc/passwd", Some("/assets/")),
            "/assets/etc/passwd"
        );
        assert_eq!(resolve_image_path("./img/a.png", Some("/assets")), "/assets/img/a.png");
    }

    #[test]
    fn test_resolve_strips_nested_traversal() {
        assert_eq!(
            resolve_image_path("....//etc/passwd", Some("/assets")),
            "/assets/..../etc/passwd"
        );
        assert_eq!(resolve_image_path("..././x", Some("/assets")), "/assets/.../x");
        assert_eq!(resolve_image_path("a/../../b.png", Some("/assets")), "/assets/a/b.png");
        for src in ["....//etc/passwd", "..././x", "a/./../../b", "/../../c"] {
            let resolved = resolve_image_path(src, Some("/assets"));
            assert!(
                !resolved.split('/').any(|segment| segment == ".."),
                "{src} resolved to {resolved}"
            );
        }
    }

    #[test]
    fn test_resolve_without_base_is_unchanged() {
        assert_eq!(resolve_image_path("../a.png", None), "../a.png");
    }

    #[test]
    fn test_is_local() {
        assert!(is_local("img/a.png"));
        assert!(is_local("/abs/a.png"));
        assert!(!is_local("http://x/a.png"));
        assert!(!is_local("https://x/a.png"));
        assert!(!is_local("data:image/png;base64,AAA"));
    }

    #[test]
    fn test_file_source_reads_local_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, png_bytes(4, 3)).unwrap();
        let dims = FileSource.fetch(path.to_str().unwrap()).unwrap();
        assert_eq!(dims, (4, 3));
    }

    #[test]
    fn test_file_source_decodes_data_uri() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(2, 5)));
        assert_eq!(FileSource.fetch(&uri).unwrap(), (2, 5));
    }

    #[test]
    fn test_file_source_rejects_remote_and_plain_data() {
        assert!(matches!(
            FileSource.fetch("https://x.dev/a.png"),
            Err(ImageError::Unsupported(_))
        ));
        assert!(matches!(
            FileSource.fetch("data:text/plain,hello"),
            Err(ImageError::InvalidDataUri)
        ));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(FileSource.fetch("/definitely/not/here.png").is_err());
    }
}
