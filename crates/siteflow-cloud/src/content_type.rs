//! Content-Type and Cache-Control per uploaded file

use std::path::Path;

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";
const LONG_LIVED: &str = "max-age=31536000";
const DEFAULT_CACHE: &str = "max-age=86400";
const FALLBACK_TYPE: &str = "application/octet-stream";

/// HTTP metadata attached to an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: &'static str,
    pub cache_control: &'static str,
}

impl ObjectMetadata {
    /// Metadata by file extension (case-insensitive).
    ///
    /// HTML is never cached so a new deploy is visible immediately; hashed
    /// assets (scripts, styles, images, fonts) are cached for a year.
    pub fn for_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let (content_type, cache_control) = match ext.as_str() {
            "html" | "htm" => ("text/html", NO_CACHE),
            "css" => ("text/css", LONG_LIVED),
            "js" | "mjs" | "cjs" => ("application/javascript", LONG_LIVED),
            "json" | "map" => ("application/json", DEFAULT_CACHE),
            "webmanifest" => ("application/manifest+json", DEFAULT_CACHE),
            "txt" => ("text/plain", DEFAULT_CACHE),
            "xml" => ("application/xml", DEFAULT_CACHE),
            "wasm" => ("application/wasm", LONG_LIVED),
            "svg" => ("image/svg+xml", LONG_LIVED),
            "png" => ("image/png", LONG_LIVED),
            "jpg" | "jpeg" => ("image/jpeg", LONG_LIVED),
            "gif" => ("image/gif", LONG_LIVED),
            "webp" => ("image/webp", LONG_LIVED),
            "avif" => ("image/avif", LONG_LIVED),
            "ico" => ("image/x-icon", LONG_LIVED),
            "woff" => ("font/woff", LONG_LIVED),
            "woff2" => ("font/woff2", LONG_LIVED),
            "ttf" => ("font/ttf", LONG_LIVED),
            "otf" => ("font/otf", LONG_LIVED),
            "eot" => ("application/vnd.ms-fontobject", LONG_LIVED),
            "pdf" => ("application/pdf", DEFAULT_CACHE),
            "mp4" => ("video/mp4", LONG_LIVED),
            "webm" => ("video/webm", LONG_LIVED),
            _ => (FALLBACK_TYPE, DEFAULT_CACHE),
        };

        Self {
            content_type,
            cache_control,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_type(file: &str) -> &'static str {
        ObjectMetadata::for_path(Path::new(file)).content_type
    }

    #[test]
    fn test_html_and_js() {
        assert_eq!(content_type("index.html"), "text/html");
        assert_eq!(content_type("static/js/main.3f2a.js"), "application/javascript");
    }

    #[test]
    fn test_assets() {
        assert_eq!(content_type("static/css/main.css"), "text/css");
        assert_eq!(content_type("manifest.json"), "application/json");
        assert_eq!(content_type("logo.svg"), "image/svg+xml");
        assert_eq!(content_type("photo.JPG"), "image/jpeg");
        assert_eq!(content_type("favicon.ico"), "image/x-icon");
        assert_eq!(content_type("fonts/inter.woff2"), "font/woff2");
        assert_eq!(content_type("fonts/inter.ttf"), "font/ttf");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type("LICENSE"), "application/octet-stream");
        assert_eq!(content_type("data.bin"), "application/octet-stream");
    }

    #[test]
    fn test_cache_control() {
        let html = ObjectMetadata::for_path(Path::new("about/index.html"));
        assert_eq!(html.cache_control, "no-cache, no-store, must-revalidate");

        let js = ObjectMetadata::for_path(Path::new("app.js"));
        assert_eq!(js.cache_control, "max-age=31536000");

        let json = ObjectMetadata::for_path(Path::new("asset-manifest.json"));
        assert_eq!(json.cache_control, "max-age=86400");
    }
}
