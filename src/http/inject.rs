//! Live-reload client injection into served HTML.
//!
//! # Responsibilities
//! - Locate the document's body element
//! - Insert the client library `<script src>` and an inline subscriber
//!   just before `</body>`
//!
//! When the opening `<body>` tag exists but the closing tag was omitted,
//! the scripts go at the end of the document, where the body implicitly
//! ends. A document with no body element at all is rejected.

use thiserror::Error;

/// Injection failures. The static resolver serves the original bytes on any of these.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("document is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("document has no body element")]
    MissingBody,

    #[error("failed to encode script parameter: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Builds and inserts the live-reload markup.
#[derive(Debug, Clone)]
pub struct HtmlInjector {
    client_path: String,
    endpoint: String,
}

impl HtmlInjector {
    /// `client_path` is where the client library is served,
    /// `endpoint` the WebSocket path it subscribes to.
    pub fn new(client_path: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client_path: client_path.into(),
            endpoint: endpoint.into(),
        }
    }

    /// The two script elements appended to the body.
    pub fn markup(&self) -> Result<String, InjectionError> {
        let src = serde_json::to_string(&self.client_path)?;
        let endpoint = serde_json::to_string(&self.endpoint)?;

        let mut out = String::new();
        out.push_str("<script data-devserve-reload src=");
        out.push_str(&src);
        out.push_str("></script>");
        out.push_str("<script data-devserve-reload>");
        out.push_str("DevServerReload.connect(");
        out.push_str(&endpoint);
        out.push_str(").on('refresh',function(){window.location.reload();});");
        out.push_str("</script>");
        Ok(out)
    }

    /// Return `html` with the live-reload scripts inserted into its body.
    pub fn inject(&self, html: &[u8]) -> Result<Vec<u8>, InjectionError> {
        let text = std::str::from_utf8(html)?;
        let lower = text.to_ascii_lowercase();

        let open = find_body_open(&lower).ok_or(InjectionError::MissingBody)?;
        let insert_at = match lower.rfind("</body") {
            Some(close) if close > open => close,
            Some(_) => return Err(InjectionError::MissingBody),
            None => text.len(),
        };

        let markup = self.markup()?;
        let mut out = String::with_capacity(text.len() + markup.len());
        out.push_str(&text[..insert_at]);
        out.push_str(&markup);
        out.push_str(&text[insert_at..]);
        Ok(out.into_bytes())
    }
}

/// Byte offset of the first `<body` start tag. `<bodyfoo>` does not count.
fn find_body_open(lower: &str) -> Option<usize> {
    let bytes = lower.as_bytes();
    let mut from = 0;
    while let Some(rel) = lower[from..].find("<body") {
        let idx = from + rel;
        match bytes.get(idx + "<body".len()) {
            Some(b'>') | Some(b'/') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => {
                return Some(idx)
            }
            _ => from = idx + 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn injector() -> HtmlInjector {
        HtmlInjector::new("/__livereload/client.js", "/__livereload")
    }

    fn inject_str(html: &str) -> Result<String, InjectionError> {
        injector()
            .inject(html.as_bytes())
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_inserts_two_scripts_before_body_close() {
        let html = "<!doctype html><html><head><title>t</title></head><body><p>Hello</p></body></html>";
        let out = inject_str(html).unwrap();

        assert_eq!(out.matches("<script").count(), 2);
        assert!(out.contains(r#"src="/__livereload/client.js""#));
        assert!(out.contains(r#"DevServerReload.connect("/__livereload")"#));
        assert!(out.starts_with("<!doctype html><html><head><title>t</title></head><body><p>Hello</p><script"));
        assert!(out.ends_with("</script></body></html>"));
    }

    #[test]
    fn test_preserves_original_content() {
        let html = "<html><BODY class=\"x\">\n<main>keep me</main>\n</BODY></html>";
        let out = inject_str(html).unwrap();
        let markup = injector().markup().unwrap();

        assert_eq!(out.replace(&markup, ""), html);
    }

    #[test]
    fn test_missing_body_is_rejected() {
        let err = inject_str("<html><head></head><p>no body</p></html>").unwrap_err();
        assert!(matches!(err, InjectionError::MissingBody));

        let err = inject_str("<html><bodyguard></bodyguard></html>").unwrap_err();
        assert!(matches!(err, InjectionError::MissingBody));
    }

    #[test]
    fn test_unclosed_body_appends_at_end() {
        let out = inject_str("<html><body><p>open").unwrap();
        assert!(out.starts_with("<html><body><p>open<script"));
        assert!(out.ends_with("</script>"));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = injector().inject(&[0x3c, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, InjectionError::NotUtf8(_)));
    }
}
