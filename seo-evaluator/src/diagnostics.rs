//! Diagnostics collected during a sweep
//!
//! Configuration problems and other non-fatal findings are recorded here and
//! handed back to the caller with the sweep report. The console prints them,
//! the ajax endpoint renders them as flash-message HTML.

use serde::Serialize;
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    fn css_class(self) -> &'static str {
        match self {
            Severity::Info => "alert-info",
            Severity::Warning => "alert-warning",
            Severity::Error => "alert-danger",
        }
    }
}

/// One human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Record the message refers to, e.g. `pages:42`
    pub context: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "[{:?}] {} ({})", self.severity, self.message, context),
            None => write!(f, "[{:?}] {}", self.severity, self.message),
        }
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>, context: Option<String>) {
        self.entries.push(Diagnostic {
            severity,
            message: message.into(),
            context,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message, None);
    }

    /// Move all entries of `other` to the end of `self`
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Attach `context` to every entry that has none yet
    pub fn set_default_context(&mut self, context: &str) {
        for entry in &mut self.entries {
            if entry.context.is_none() {
                entry.context = Some(context.to_string());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity != Severity::Info)
    }

    /// Render as flash-message HTML, one alert per entry
    pub fn render_html(&self) -> String {
        let mut html = String::new();
        for entry in &self.entries {
            html.push_str(&format!(
                "<div class=\"alert {}\"><div class=\"alert-message\">{}</div>",
                entry.severity.css_class(),
                escape_html(&entry.message)
            ));
            if let Some(context) = &entry.context {
                html.push_str(&format!(
                    "<div class=\"alert-context\">{}</div>",
                    escape_html(context)
                ));
            }
            html.push_str("</div>");
        }
        html
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty() {
        assert_eq!(Diagnostics::new().render_html(), "");
    }

    #[test]
    fn test_render_escapes_and_classes() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Severity::Warning, "No focus keyword <set>", Some("pages:3".to_string()));
        diagnostics.push(Severity::Info, "done", None);

        let html = diagnostics.render_html();

        assert!(html.contains("alert-warning"));
        assert!(html.contains("alert-info"));
        assert!(html.contains("No focus keyword &lt;set&gt;"));
        assert!(html.contains("pages:3"));
        assert!(!html.contains("<set>"));
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut first = Diagnostics::new();
        first.warn("a");
        let mut second = Diagnostics::new();
        second.warn("b");
        second.push(Severity::Info, "c", None);

        first.extend(second);

        assert_eq!(first.len(), 3);
        let warnings: Vec<_> = first.warnings().map(|d| d.message.as_str()).collect();
        assert_eq!(warnings, vec!["a", "b"]);
        assert!(first.render_html().ends_with("<div class=\"alert-message\">c</div></div>"));
    }
}
