use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};

use comet_core::Sentiment;

pub const SUMMARY_MAX_CHARS: usize = 300;

const POSITIVE_WORDS: &[&str] = &[
    "gain", "rise", "surge", "higher", "up", "beat", "outperform", "strong", "tight",
];
const NEGATIVE_WORDS: &[&str] = &[
    "fall", "drop", "decline", "slip", "lower", "down", "miss", "weaker", "loose", "draw",
];

/// Instrument vocabulary: recognized symbol plus the lowercase spellings that
/// count as a mention. Output order follows this table, not the input text.
const TICKER_CANDIDATES: &[(&str, &[&str])] = &[
    ("NG", &["ng", "natural gas"]),
    ("WTI", &["wti"]),
    ("Brent", &["brent"]),
    ("JKM", &["jkm"]),
    ("TTF", &["ttf"]),
    ("Gold", &["gold"]),
    ("Silver", &["silver"]),
    ("Copper", &["copper"]),
];

lazy_static! {
    static ref PARAGRAPH: Selector = Selector::parse("p").unwrap();
}

/// Stable content identity: SHA-256 over `url + "|" + headline`. Two records
/// with the same URL and headline always hash identically, whatever their
/// other fields do across fetches.
pub fn compute_identity(url: Option<&str>, headline: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(headline.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Parse a source timestamp (RFC 3339 or RFC 2822) into UTC. Missing or
/// unparseable input falls back to the current time rather than failing the
/// record.
pub fn normalize_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| {
        let s = s.trim();
        DateTime::parse_from_rfc3339(s)
            .or_else(|_| DateTime::parse_from_rfc2822(s))
            .ok()
    })
    .map(|dt| dt.with_timezone(&Utc))
    .unwrap_or_else(Utc::now)
}

/// Derive a short summary from arbitrary markup: the first up to three
/// non-empty paragraph texts, or the whole stripped text when the document
/// has no paragraphs. Truncated to `max_chars` characters with a `...`
/// marker when cut. Malformed or empty markup yields an empty string.
pub fn extract_summary(markup: &str, max_chars: usize) -> String {
    if markup.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(markup);
    let paragraphs: Vec<String> = fragment
        .select(&PARAGRAPH)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .take(3)
        .collect();
    let text = if paragraphs.is_empty() {
        collapse_whitespace(&fragment.root_element().text().collect::<String>())
    } else {
        paragraphs.join(" ")
    };
    truncate_chars(&text, max_chars)
}

/// Count case-insensitive lexicon matches over the text; strict majority
/// wins, everything else (including a tie of nonzero counts) is neutral.
pub fn classify_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(**w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(**w)).count();
    if positive > negative {
        Sentiment::Positive
    } else if negative > positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Recognized instrument symbols mentioned in the headline, in vocabulary
/// order, without duplicates.
pub fn extract_tickers(headline: &str) -> Vec<String> {
    let lower = headline.to_lowercase();
    TICKER_CANDIDATES
        .iter()
        .filter(|(_, spellings)| spellings.iter().any(|s| lower.contains(s)))
        .map(|(symbol, _)| (*symbol).to_string())
        .collect()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
