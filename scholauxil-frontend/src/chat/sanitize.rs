use std::fmt;

/// HTML that has been through the sanitizer and may be rendered unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedHtml(String);

impl SanitizedHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SanitizedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip scripts, event handlers and other executable markup from `html`.
pub fn sanitize(html: &str) -> SanitizedHtml {
    SanitizedHtml(ammonia::clean(html))
}
