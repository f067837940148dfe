//! Referral code allocation.
//!
//! A code is a 4-letter prefix derived from the display name followed by a
//! 3-digit suffix: `John Doe` -> `JOHN000`, `JOHN001`, ...

use crate::error::{AppError, AppResult};
use std::collections::HashSet;

pub const PREFIX_LEN: usize = 4;
pub const SUFFIX_DIGITS: usize = 3;
pub const REFERRAL_CODE_LEN: usize = PREFIX_LEN + SUFFIX_DIGITS;

const PREFIX_FILLER: char = 'X';
const MAX_SUFFIX: i64 = 999;

/// Upper-cased ASCII letters of the name, first four, padded with `X`.
pub fn referral_prefix(display_name: &str) -> String {
    let mut prefix: String = display_name
        .chars()
        .flat_map(char::to_uppercase)
        .filter(char::is_ascii_alphabetic)
        .take(PREFIX_LEN)
        .collect();
    while prefix.len() < PREFIX_LEN {
        prefix.push(PREFIX_FILLER);
    }
    prefix
}

/// Picks the smallest free suffix under the name's prefix.
///
/// `existing_codes` may contain anything; only 7-character codes that start
/// with the prefix and end in a parseable number are taken into account.
pub fn allocate_referral_code<I, S>(display_name: &str, existing_codes: I) -> AppResult<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = referral_prefix(display_name);

    let used: HashSet<i64> = existing_codes
        .into_iter()
        .filter_map(|code| {
            let code = code.as_ref();
            if code.chars().count() != REFERRAL_CODE_LEN || !code.starts_with(&prefix) {
                return None;
            }
            code[PREFIX_LEN..].parse::<i64>().ok()
        })
        .collect();

    let next = (0..=MAX_SUFFIX)
        .find(|n| !used.contains(n))
        .ok_or_else(|| {
            AppError::Conflict(format!("All referral codes for prefix {prefix} are taken"))
        })?;

    Ok(format!("{prefix}{next:0width$}", width = SUFFIX_DIGITS))
}
