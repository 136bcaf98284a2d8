//! Internal helpers for validation and conversion.
//!
//! These utilities are **not** part of the public API.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Folds a display name into the key used for uniqueness checks.
///
/// Accents are stripped, case is folded and every run of punctuation or
/// whitespace collapses into a single space, so `"Café  Bar"` and
/// `"cafe-bar"` collide.
pub(crate) fn normalize_name_key(input: &str) -> String {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Folds free text for case and accent insensitive substring search.
///
/// Unlike [`normalize_name_key`] punctuation and spacing are kept, so a
/// folded needle still lines up with the folded haystack.
pub(crate) fn fold_text(input: &str) -> String {
    input
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Midnight UTC at the start of `date`.
pub(crate) fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Midnight UTC at the start of the day after `date`.
pub(crate) fn next_day_start(date: NaiveDate) -> ResultEngine<DateTime<Utc>> {
    date.succ_opt()
        .map(day_start)
        .ok_or_else(|| EngineError::Validation(format!("date out of range: {date}")))
}

/// Rejects amounts that are not strictly positive.
pub(crate) fn ensure_positive_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(())
}
