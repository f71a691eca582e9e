//! Parsed view of a rendered page
//!
//! Regex-based extraction of the parts the checks look at. This is not a
//! full HTML parser; it handles the markup CMS templates produce.

use once_cell::sync::Lazy;
use regex::Regex;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid regex"));
static META_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("valid regex"));
static IMG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid regex"));
static H1_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1>").expect("valid regex"));
static H2_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h2\b[^>]*>(.*?)</h2>").expect("valid regex"));
static BODY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body>").expect("valid regex"));
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid regex")
});
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script>").expect("valid regex"));
static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b.*?</style>").expect("valid regex"));
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// An `<img>` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub src: Option<String>,
    pub alt: Option<String>,
}

impl Image {
    pub fn has_alt(&self) -> bool {
        self.alt.as_deref().is_some_and(|alt| !alt.trim().is_empty())
    }
}

/// Extracted page structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDocument {
    pub title: String,
    pub description: String,
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub images: Vec<Image>,
    /// Visible body text, whitespace collapsed
    pub body_text: String,
    /// Lowercased words of the body text
    pub words: Vec<String>,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        let title = TITLE_RE
            .captures(html)
            .map(|c| plain_text(&c[1]))
            .unwrap_or_default();

        let description = META_RE
            .find_iter(html)
            .map(|m| attributes(m.as_str()))
            .find(|attrs| attr(attrs, "name").is_some_and(|n| n.eq_ignore_ascii_case("description")))
            .and_then(|attrs| attr(&attrs, "content").map(plain_text))
            .unwrap_or_default();

        let h1 = H1_RE.captures_iter(html).map(|c| plain_text(&c[1])).collect();
        let h2 = H2_RE.captures_iter(html).map(|c| plain_text(&c[1])).collect();

        let images = IMG_RE
            .find_iter(html)
            .map(|m| {
                let attrs = attributes(m.as_str());
                Image {
                    src: attr(&attrs, "src").map(str::to_string),
                    alt: attr(&attrs, "alt").map(str::to_string),
                }
            })
            .collect();

        let body = BODY_RE
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or(html);
        let body_text = plain_text(body);
        let words = split_words(&body_text);

        Self {
            title,
            description,
            h1,
            h2,
            images,
            body_text,
            words,
        }
    }

    pub fn images_without_alt(&self) -> usize {
        self.images.iter().filter(|image| !image.has_alt()).count()
    }
}

/// `href` of `<link rel="canonical">`, if the page declares one
pub fn canonical_url(html: &str) -> Option<String> {
    LINK_RE
        .find_iter(html)
        .map(|m| attributes(m.as_str()))
        .find(|attrs| attr(attrs, "rel").is_some_and(|r| r.eq_ignore_ascii_case("canonical")))
        .and_then(|attrs| attr(&attrs, "href").map(|h| decode_entities(h.trim())))
        .filter(|href| !href.is_empty())
}

/// Lowercased alphanumeric words
pub fn split_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn attributes(tag: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(tag)
        .map(|c| {
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            (c[1].to_ascii_lowercase(), value.to_string())
        })
        .collect()
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Strip markup and collapse whitespace
fn plain_text(fragment: &str) -> String {
    let text = SCRIPT_RE.replace_all(fragment, " ");
    let text = STYLE_RE.replace_all(&text, " ");
    let text = COMMENT_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = decode_entities(&text);
    SPACE_RE.replace_all(&text, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Fresh Coffee &amp; Cake</title>
  <meta charset="utf-8">
  <meta name="Description" content="Roasted daily in town.">
  <link rel="stylesheet" href="/main.css">
  <link rel="canonical" href="https://example.org/coffee">
  <style>body { color: red; }</style>
</head>
<body class="page">
  <h1>Fresh <em>coffee</em></h1>
  <h2>Beans</h2><h2>Cakes</h2>
  <script>var coffee = 1;</script>
  <!-- hidden coffee -->
  <p>We roast coffee&nbsp;every morning.</p>
  <img src="/a.jpg" alt="A cup">
  <img src='/b.jpg'>
  <img src=/c.jpg alt="  ">
</body>
</html>"#;

    #[test]
    fn test_parse_head() {
        let doc = PageDocument::parse(PAGE);
        assert_eq!(doc.title, "Fresh Coffee & Cake");
        assert_eq!(doc.description, "Roasted daily in town.");
    }

    #[test]
    fn test_parse_headings() {
        let doc = PageDocument::parse(PAGE);
        assert_eq!(doc.h1, vec!["Fresh coffee".to_string()]);
        assert_eq!(doc.h2.len(), 2);
    }

    #[test]
    fn test_images_without_alt() {
        let doc = PageDocument::parse(PAGE);
        assert_eq!(doc.images.len(), 3);
        assert_eq!(doc.images_without_alt(), 2);
        assert_eq!(doc.images[2].src.as_deref(), Some("/c.jpg"));
    }

    #[test]
    fn test_body_text_skips_script_style_comments() {
        let doc = PageDocument::parse(PAGE);
        assert!(doc.body_text.contains("We roast coffee every morning."));
        assert!(!doc.body_text.contains("var coffee"));
        assert!(!doc.body_text.contains("hidden"));
        assert!(!doc.body_text.contains("color"));
        assert_eq!(doc.words.iter().filter(|w| *w == "coffee").count(), 2);
    }

    #[test]
    fn test_canonical_url() {
        assert_eq!(canonical_url(PAGE).as_deref(), Some("https://example.org/coffee"));
        assert_eq!(canonical_url("<p>no head</p>"), None);
    }

    #[test]
    fn test_plain_fragment_without_body() {
        let doc = PageDocument::parse("<p>Just text</p>");
        assert_eq!(doc.title, "");
        assert_eq!(doc.words, vec!["just".to_string(), "text".to_string()]);
    }
}
