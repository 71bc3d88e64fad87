//! Email text normalization.
//!
//! Turns raw email text into the canonical form the vectorizer is fitted
//! on. The transform is deterministic and idempotent: placeholder tokens
//! are lowercase words that no later step rewrites.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADER_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n\r?\n").unwrap());
static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").unwrap());
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+(?:[.,]\d+)?\b").unwrap());
static PUNCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub const URL_TOKEN: &str = "url";
pub const EMAIL_TOKEN: &str = "emailaddr";
pub const NUMBER_TOKEN: &str = "number";

/// Switches for each normalization step.
///
/// Persisted inside the model artifact so serving applies exactly the
/// transform the model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorOptions {
    /// Drop everything before the first blank line.
    pub strip_headers: bool,
    pub lowercase: bool,
    pub replace_urls: bool,
    pub replace_emails: bool,
    pub replace_numbers: bool,
    pub remove_punctuation: bool,
}

impl Default for PreprocessorOptions {
    fn default() -> Self {
        Self {
            strip_headers: true,
            lowercase: true,
            replace_urls: true,
            replace_emails: true,
            replace_numbers: true,
            remove_punctuation: true,
        }
    }
}

/// Stateless email text normalizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preprocessor {
    options: PreprocessorOptions,
}

impl Preprocessor {
    pub fn new(options: PreprocessorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> PreprocessorOptions {
        self.options
    }

    /// Normalize one email. Empty output is valid.
    pub fn normalize(&self, text: &str) -> String {
        let opts = &self.options;

        let mut text = if opts.strip_headers {
            strip_headers(text).to_string()
        } else {
            text.to_string()
        };

        if opts.lowercase {
            text = text.to_lowercase();
        }
        if opts.replace_urls {
            text = replace_with_token(&URL, &text, URL_TOKEN);
        }
        if opts.replace_emails {
            text = replace_with_token(&EMAIL, &text, EMAIL_TOKEN);
        }
        if opts.replace_numbers {
            text = replace_with_token(&NUMBER, &text, NUMBER_TOKEN);
        }
        if opts.remove_punctuation {
            text = PUNCT.replace_all(&text, " ").into_owned();
        }

        WHITESPACE.replace_all(&text, " ").trim().to_string()
    }
}

/// Everything after the first blank line, or the whole text if there is none.
fn strip_headers(text: &str) -> &str {
    match HEADER_SPLIT.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

fn replace_with_token(re: &Regex, text: &str, token: &str) -> String {
    re.replace_all(text, format!(" {token} ").as_str()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> String {
        Preprocessor::default().normalize(text)
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(normalize("URGENT!!! Act NOW."), "urgent act now");
    }

    #[test]
    fn replaces_urls() {
        assert_eq!(
            normalize("Click http://fake-bank.com/login?id=1 or www.evil.org now"),
            "click url or url now"
        );
    }

    #[test]
    fn replaces_email_addresses() {
        assert_eq!(
            normalize("Write to support.team+x@bank-help.co.uk today"),
            "write to emailaddr today"
        );
    }

    #[test]
    fn replaces_numbers_including_decimals() {
        assert_eq!(
            normalize("Your order #12345 costs 19.99 and ships in 2-3 days"),
            "your order number costs number and ships in number number days"
        );
    }

    #[test]
    fn digits_inside_words_are_kept() {
        assert_eq!(normalize("paypa1 secure"), "paypa1 secure");
    }

    #[test]
    fn strips_headers_before_first_blank_line() {
        let raw = "From: a@b.com\r\nSubject: Hello\r\n\r\nThe body text.\n\nSecond paragraph.";
        assert_eq!(normalize(raw), "the body text second paragraph");
    }

    #[test]
    fn header_stripping_can_be_disabled() {
        let pre = Preprocessor::new(PreprocessorOptions {
            strip_headers: false,
            ..Default::default()
        });
        assert_eq!(pre.normalize("Subject: hi\n\nbody"), "subject hi body");
    }

    #[test]
    fn lowercase_can_be_disabled() {
        let pre = Preprocessor::new(PreprocessorOptions {
            lowercase: false,
            ..Default::default()
        });
        assert_eq!(pre.normalize("Hello World"), "Hello World");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  a\t\tb \n c  "), "a b c");
    }

    #[test]
    fn empty_after_normalization_is_allowed() {
        assert_eq!(normalize("!!! ??? ..."), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "URGENT! Your account has been suspended! Click http://fake-bank.com now!",
            "Hi, your order #12345 has shipped and will arrive in 2-3 days.",
            "Headers: x\n\nMail me at someone@example.com, 3.5% off www.shop.io",
            "1.5abc a.1 x_1 ÉCOLE Ünïcödé",
            "",
        ];
        let pre = Preprocessor::default();
        for sample in samples {
            let once = pre.normalize(sample);
            let twice = pre.normalize(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: PreprocessorOptions =
            serde_json::from_str(r#"{"strip_headers": false}"#).unwrap();
        assert!(!opts.strip_headers);
        assert!(opts.lowercase);
        assert!(opts.replace_numbers);
    }
}
