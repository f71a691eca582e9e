//! Built-in checks
//!
//! | name              | good                          | warning              | bad             |
//! |-------------------|-------------------------------|----------------------|-----------------|
//! | `title`           | 40-57 chars                   | other non-empty      | empty           |
//! | `description`     | 140-156 chars                 | other non-empty      | empty           |
//! | `h1`              | exactly one                   |                      | none or several |
//! | `h2`              | at least one                  | none                 |                 |
//! | `images`          | every image has alt text      |                      | any without alt |
//! | `content_length`  | ≥ 300 words                   | ≥ 100 words          | fewer           |
//! | `keyword`         | in title, description, h1, body | in some of them / not set | in none   |
//! | `keyword_density` | 1-4 %                         | other > 0 / not set  | 0               |

use super::document::split_words;
use super::{Check, CheckResult, CheckState, PageDocument};
use crate::diagnostics::Diagnostics;
use serde_json::json;

/// The built-in catalogue in registration order
pub fn default_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(LengthCheck::title()),
        Box::new(LengthCheck::description()),
        Box::new(H1Check),
        Box::new(H2Check),
        Box::new(ImagesCheck),
        Box::new(ContentLengthCheck::default()),
        Box::new(KeywordCheck),
        Box::new(KeywordDensityCheck::default()),
    ]
}

#[derive(Debug, Clone, Copy)]
enum LengthField {
    Title,
    Description,
}

/// Character length of the title or meta description
#[derive(Debug, Clone)]
pub struct LengthCheck {
    field: LengthField,
    min: usize,
    max: usize,
}

impl LengthCheck {
    pub fn title() -> Self {
        Self {
            field: LengthField::Title,
            min: 40,
            max: 57,
        }
    }

    pub fn description() -> Self {
        Self {
            field: LengthField::Description,
            min: 140,
            max: 156,
        }
    }
}

impl Check for LengthCheck {
    fn name(&self) -> &'static str {
        match self.field {
            LengthField::Title => "title",
            LengthField::Description => "description",
        }
    }

    fn evaluate(&self, document: &PageDocument, _: &str, _: &mut Diagnostics) -> CheckResult {
        let text = match self.field {
            LengthField::Title => &document.title,
            LengthField::Description => &document.description,
        };
        let length = text.chars().count();

        let state = if length == 0 {
            CheckState::Bad
        } else if (self.min..=self.max).contains(&length) {
            CheckState::Good
        } else {
            CheckState::Warning
        };

        CheckResult::new(state)
            .with_count(length)
            .with_details(json!({ "min": self.min, "max": self.max }))
    }
}

/// Exactly one `<h1>`
#[derive(Debug, Clone, Copy)]
pub struct H1Check;

impl Check for H1Check {
    fn name(&self) -> &'static str {
        "h1"
    }

    fn evaluate(&self, document: &PageDocument, _: &str, _: &mut Diagnostics) -> CheckResult {
        let count = document.h1.len();
        let state = if count == 1 {
            CheckState::Good
        } else {
            CheckState::Bad
        };
        CheckResult::new(state).with_count(count)
    }
}

/// At least one `<h2>`
#[derive(Debug, Clone, Copy)]
pub struct H2Check;

impl Check for H2Check {
    fn name(&self) -> &'static str {
        "h2"
    }

    fn evaluate(&self, document: &PageDocument, _: &str, _: &mut Diagnostics) -> CheckResult {
        let count = document.h2.len();
        let state = if count > 0 {
            CheckState::Good
        } else {
            CheckState::Warning
        };
        CheckResult::new(state).with_count(count)
    }
}

/// Images without alternative text
#[derive(Debug, Clone, Copy)]
pub struct ImagesCheck;

impl Check for ImagesCheck {
    fn name(&self) -> &'static str {
        "images"
    }

    fn evaluate(&self, document: &PageDocument, _: &str, _: &mut Diagnostics) -> CheckResult {
        let missing = document.images_without_alt();
        let state = if missing == 0 {
            CheckState::Good
        } else {
            CheckState::Bad
        };
        let without_alt: Vec<&str> = document
            .images
            .iter()
            .filter(|image| !image.has_alt())
            .filter_map(|image| image.src.as_deref())
            .collect();

        CheckResult::new(state).with_count(missing).with_details(json!({
            "images": document.images.len(),
            "without_alt": without_alt,
        }))
    }
}

/// Word count of the visible body text
#[derive(Debug, Clone)]
pub struct ContentLengthCheck {
    good_words: usize,
    warning_words: usize,
}

impl Default for ContentLengthCheck {
    fn default() -> Self {
        Self {
            good_words: 300,
            warning_words: 100,
        }
    }
}

impl Check for ContentLengthCheck {
    fn name(&self) -> &'static str {
        "content_length"
    }

    fn evaluate(&self, document: &PageDocument, _: &str, _: &mut Diagnostics) -> CheckResult {
        let words = document.words.len();
        let state = if words >= self.good_words {
            CheckState::Good
        } else if words >= self.warning_words {
            CheckState::Warning
        } else {
            CheckState::Bad
        };
        CheckResult::new(state).with_count(words)
    }
}

/// Focus keyword placement in title, description, h1 and body
#[derive(Debug, Clone, Copy)]
pub struct KeywordCheck;

impl Check for KeywordCheck {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn evaluate(
        &self,
        document: &PageDocument,
        keyword: &str,
        diagnostics: &mut Diagnostics,
    ) -> CheckResult {
        if keyword.is_empty() {
            diagnostics.warn("No focus keyword configured");
            return not_set();
        }

        let needle = keyword.to_lowercase();
        let contains = |text: &str| text.to_lowercase().contains(&needle);

        let in_title = contains(&document.title);
        let in_description = contains(&document.description);
        let in_h1 = document.h1.iter().any(|h| contains(h));
        let in_body = contains(&document.body_text);

        let hits = [in_title, in_description, in_h1, in_body]
            .iter()
            .filter(|hit| **hit)
            .count();
        let state = match hits {
            4 => CheckState::Good,
            0 => CheckState::Bad,
            _ => CheckState::Warning,
        };

        CheckResult::new(state)
            .with_count(phrase_occurrences(&document.words, &split_words(keyword)))
            .with_details(json!({
                "keyword": keyword,
                "title": in_title,
                "description": in_description,
                "h1": in_h1,
                "body": in_body,
            }))
    }
}

/// Share of body words taken up by the focus keyword
#[derive(Debug, Clone)]
pub struct KeywordDensityCheck {
    min_percent: f64,
    max_percent: f64,
}

impl Default for KeywordDensityCheck {
    fn default() -> Self {
        Self {
            min_percent: 1.0,
            max_percent: 4.0,
        }
    }
}

impl Check for KeywordDensityCheck {
    fn name(&self) -> &'static str {
        "keyword_density"
    }

    fn evaluate(&self, document: &PageDocument, keyword: &str, _: &mut Diagnostics) -> CheckResult {
        let phrase = split_words(keyword);
        if phrase.is_empty() {
            return not_set();
        }

        let occurrences = phrase_occurrences(&document.words, &phrase);
        let total = document.words.len();
        let density = if total == 0 {
            0.0
        } else {
            (occurrences * phrase.len()) as f64 / total as f64 * 100.0
        };

        let state = if occurrences == 0 {
            CheckState::Bad
        } else if density >= self.min_percent && density <= self.max_percent {
            CheckState::Good
        } else {
            CheckState::Warning
        };

        CheckResult::new(state).with_count(occurrences).with_details(json!({
            "density": (density * 100.0).round() / 100.0,
            "words": total,
            "min": self.min_percent,
            "max": self.max_percent,
        }))
    }
}

fn not_set() -> CheckResult {
    CheckResult::new(CheckState::Warning).with_details(json!({ "not_set": true }))
}

/// Non-overlapping occurrences of a word sequence
fn phrase_occurrences(words: &[String], phrase: &[String]) -> usize {
    if phrase.is_empty() || words.len() < phrase.len() {
        return 0;
    }

    let mut count = 0;
    let mut i = 0;
    while i + phrase.len() <= words.len() {
        if words[i..i + phrase.len()] == *phrase {
            count += 1;
            i += phrase.len();
        } else {
            i += 1;
        }
    }
    count
}
