//! Extraction of structured tokens from assistant output and plan file names.
//!
//! Every function here is total: when nothing matches, a defined empty value is
//! returned instead of an error.
//!
//! - `extract_beads_id`: first `beads-<alnum>` issue identifier in free text
//! - `extract_phase_name`: human-readable label from `<NN>-<slug>.md`
//! - `extract_phase_number`: the numeric ordering prefix of a phase file
//! - `combine_context`: blank-line join of accumulated context

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

// Compile regexes once using LazyLock
static BEADS_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"beads-[[:alnum:]]+").unwrap());

static NUMERIC_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-").unwrap());

/// Words dropped from phase labels because they carry no meaning of their own.
const FILLER_WORDS: &[&str] = &["implement", "implementation"];

/// Separator placed between accumulated context blocks.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Return the first `beads-<alnum>` token in `text`, or an empty string.
pub fn extract_beads_id(text: &str) -> String {
    BEADS_ID_REGEX
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Derive a human-readable phase label from a plan file name.
///
/// `01-phase-1-setup.md` becomes `1 Setup` and `02-implement-feature.md`
/// becomes `Feature`. Names without a numeric prefix, or with nothing left
/// after filler removal, come back as the bare stem (`simple.md` → `simple`).
pub fn extract_phase_name(filename: &str) -> String {
    let stem = file_stem(filename);

    let Some(prefix) = NUMERIC_PREFIX_REGEX.find(stem) else {
        return stem.to_string();
    };

    let words: Vec<&str> = stem[prefix.end()..]
        .split('-')
        .filter(|w| !w.is_empty())
        .collect();

    let mut kept = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        let numbered_phase = lower == "phase"
            && words
                .get(i + 1)
                .is_some_and(|next| next.chars().all(|c| c.is_ascii_digit()));
        if numbered_phase || FILLER_WORDS.contains(&lower.as_str()) {
            continue;
        }
        kept.push(capitalize(word));
    }

    if kept.is_empty() {
        return stem.to_string();
    }
    kept.join(" ")
}

/// Numeric ordering prefix of a phase file (`03-db.md` → `Some(3)`).
pub fn extract_phase_number(filename: &str) -> Option<u32> {
    NUMERIC_PREFIX_REGEX
        .captures(file_stem(filename))
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Append `additional` to `existing`, separated by a blank line.
///
/// An empty side contributes nothing, so no leading or trailing separator is
/// ever produced.
pub fn combine_context(existing: &str, additional: &str) -> String {
    if additional.trim().is_empty() {
        return existing.to_string();
    }
    if existing.is_empty() {
        return additional.to_string();
    }
    format!("{}{}{}", existing, CONTEXT_SEPARATOR, additional)
}

fn file_stem(filename: &str) -> &str {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    base.strip_suffix(".md").unwrap_or(base)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
