//! Display helpers shared by every view.

use chrono::{DateTime, Utc};

/// First letter of each word, uppercased: "ada lovelace" → "AL".
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Stable palette slot for a name. Same 32-bit rolling hash
/// (`h * 31 + unit` over UTF-16 units) on every platform.
pub fn name_color_index(name: &str, palette_len: usize) -> usize {
    if palette_len == 0 {
        return 0;
    }
    let hash = name
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    hash.unsigned_abs() as usize % palette_len
}

/// `Jan 5, 2025`
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// `Jan 5, 2025, 3:04 PM`
pub fn format_date_time(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y, %-I:%M %p").to_string()
}

/// Empty for a missing date.
pub fn format_optional_date(at: Option<&DateTime<Utc>>) -> String {
    at.map(format_date).unwrap_or_default()
}

// ── Tests ──────────────────────────────────────────────────────
