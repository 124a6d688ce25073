use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use super::cleaner::{CleanOutcome, Cleaner};

/// Explicit http(s) URLs, or bare `host.tld[/path]` tokens.
const URL_PATTERN: &str =
    r#"(?i)\bhttps?://[^\s<>"'`]+|\b(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}(?:/[^\s<>"'`]*)?"#;

static URL_RE: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_RE.get_or_init(|| Regex::new(URL_PATTERN).expect("URL_PATTERN is a valid regex"))
}

/// A URL-looking span of text. Offsets are byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// A supported social URL found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    #[serde(flatten)]
    pub span: UrlSpan,
    pub clean_url: String,
    pub platform: String,
    pub removed: Vec<String>,
    /// True when tracking parameters were stripped. Only these get rewritten.
    pub changed: bool,
}

impl Finding {
    fn new(span: UrlSpan, outcome: CleanOutcome) -> Self {
        Self {
            span,
            changed: !outcome.removed.is_empty(),
            clean_url: outcome.result.canonical_url,
            platform: outcome.result.platform,
            removed: outcome.removed,
        }
    }
}

/// Find URL-like spans in `text`.
///
/// Trailing sentence punctuation and unbalanced closing brackets are left
/// out of the span, so `(see youtu.be/x?si=1).` yields `youtu.be/x?si=1`.
/// Bare hosts directly after `@`, `.`, `/`, `:` or a word character are skipped,
/// so emails, handles and hosts inside a larger token are left alone.
pub fn find_urls(text: &str) -> Vec<UrlSpan> {
    url_regex()
        .find_iter(text)
        .filter_map(|m| {
            let raw = m.as_str();
            let explicit = raw.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("http"));
            if !explicit && text[..m.start()].chars().next_back().is_some_and(joins_token) {
                return None;
            }
            let len = trimmed_len(raw);
            if len == 0 {
                return None;
            }
            let span = UrlSpan {
                start: m.start(),
                end: m.start() + len,
                text: raw[..len].to_string(),
            };
            log::trace!("url span {}..{}: {}", span.start, span.end, span.text);
            Some(span)
        })
        .collect()
}

/// Characters that glue a bare host onto the token before it.
fn joins_token(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '/' | ':')
}

/// Byte length of `raw` once trailing punctuation is dropped.
fn trimmed_len(raw: &str) -> usize {
    let mut s = raw;
    loop {
        let Some(last) = s.chars().next_back() else {
            return 0;
        };
        let drop = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' => true,
            ')' => unbalanced(s, '(', ')'),
            ']' => unbalanced(s, '[', ']'),
            '}' => unbalanced(s, '{', '}'),
            _ => false,
        };
        if !drop {
            return s.len();
        }
        s = &s[..s.len() - last.len_utf8()];
    }
}

fn unbalanced(s: &str, open: char, close: char) -> bool {
    s.matches(close).count() > s.matches(open).count()
}

/// Every supported social URL in `text`, with its cleaned form.
/// Spans that fail to parse or belong to no platform are skipped.
pub fn scan(cleaner: &Cleaner, text: &str) -> Vec<Finding> {
    find_urls(text)
        .into_iter()
        .filter_map(|span| {
            let outcome = cleaner.clean_detailed(&span.text).ok()?;
            Some(Finding::new(span, outcome))
        })
        .collect()
}

/// Rewrite `text`, replacing every URL that carried tracking parameters
/// with its canonical form. All other bytes are left untouched.
pub fn clean_text(cleaner: &Cleaner, text: &str) -> String {
    rewrite(text, &scan(cleaner, text))
}

/// Apply changed findings to `text`. Findings must be sorted by `start`
/// and non-overlapping, as [`scan`] returns them.
pub fn rewrite(text: &str, findings: &[Finding]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for f in findings.iter().filter(|f| f.changed) {
        out.push_str(&text[cursor..f.span.start]);
        out.push_str(&f.clean_url);
        cursor = f.span.end;
    }
    out.push_str(&text[cursor..]);
    out
}
