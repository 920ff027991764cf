use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_COUNTRY_CODE: &str = "+62";
pub const DEFAULT_MIN_DIGITS: usize = 8;
pub const DEFAULT_MAX_DIGITS: usize = 15;
pub const MAX_DIGITS_LIMIT: usize = 20;

const MIN_TOKEN_DIGITS: usize = 3;
const MAX_COUNTRY_CODE_DIGITS: usize = 4;

/// A phone number after prefix rewriting, length validation and optional
/// country-specific grouping. Normalizing its text again yields the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalNumber(String);

impl CanonicalNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitGroup {
    Exact(usize),
    Between(usize, usize),
    Rest,
}

impl DigitGroup {
    fn bounds(self, available: usize) -> (usize, usize) {
        match self {
            DigitGroup::Exact(len) => (len, len),
            DigitGroup::Between(min, max) => (min, max),
            DigitGroup::Rest => (1, available),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CountryPattern {
    pub code: &'static str,
    pub groups: &'static [DigitGroup],
}

use DigitGroup::{Between, Exact, Rest};

// Order is authoritative: the first code that prefixes a number decides its
// grouping, so new entries must be placed deliberately rather than sorted.
pub const COUNTRY_PATTERNS: &[CountryPattern] = &[
    CountryPattern {
        code: "+62",
        groups: &[Between(3, 4), Rest],
    },
    CountryPattern {
        code: "+852",
        groups: &[Exact(4), Exact(4)],
    },
    CountryPattern {
        code: "+60",
        groups: &[Between(2, 3), Rest],
    },
    CountryPattern {
        code: "+65",
        groups: &[Exact(4), Exact(4)],
    },
    CountryPattern {
        code: "+91",
        groups: &[Exact(5), Exact(5)],
    },
    CountryPattern {
        code: "+92",
        groups: &[Between(3, 4), Rest],
    },
    CountryPattern {
        code: "+880",
        groups: &[Between(3, 4), Rest],
    },
    CountryPattern {
        code: "+966",
        groups: &[Exact(3), Rest],
    },
    CountryPattern {
        code: "+971",
        groups: &[Between(2, 3), Rest],
    },
    CountryPattern {
        code: "+63",
        groups: &[Exact(3), Rest],
    },
    CountryPattern {
        code: "+234",
        groups: &[Exact(3), Rest],
    },
    CountryPattern {
        code: "+1",
        groups: &[Exact(3), Exact(3), Exact(4)],
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneRules {
    default_country_code: String,
    min_digits: usize,
    max_digits: usize,
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self {
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
            min_digits: DEFAULT_MIN_DIGITS,
            max_digits: DEFAULT_MAX_DIGITS,
        }
    }
}

impl PhoneRules {
    pub fn new(
        default_country_code: &str,
        min_digits: usize,
        max_digits: usize,
    ) -> Result<Self, CoreError> {
        let default_country_code = validate_country_code(default_country_code)?;
        validate_digit_bounds(min_digits, max_digits)?;
        Ok(Self {
            default_country_code,
            min_digits,
            max_digits,
        })
    }

    pub fn default_country_code(&self) -> &str {
        &self.default_country_code
    }

    pub fn min_digits(&self) -> usize {
        self.min_digits
    }

    pub fn max_digits(&self) -> usize {
        self.max_digits
    }

    /// Extracts the first phone-like token of `line` and returns its canonical
    /// form, or `None` when the line carries no acceptable number.
    ///
    /// A token whose digits fall outside the bounds is retried on its leading
    /// space-separated groups, longest first, so two numbers sharing a line
    /// yield the first one.
    pub fn normalize(&self, line: &str) -> Option<CanonicalNumber> {
        let token = first_number_token(line)?;
        std::iter::once(token.compact.len())
            .chain(token.group_ends.iter().rev().copied())
            .find_map(|len| self.canonicalize(&token.compact[..len]))
    }

    fn canonicalize(&self, compact: &str) -> Option<CanonicalNumber> {
        let prefixed = if compact.starts_with('+') {
            compact.to_string()
        } else if let Some(rest) = compact.strip_prefix("00") {
            format!("+{rest}")
        } else if let Some(rest) = compact.strip_prefix('0') {
            format!("{}{rest}", self.default_country_code)
        } else {
            format!("+{compact}")
        };

        let digits = prefixed.len() - 1;
        if digits < self.min_digits || digits > self.max_digits {
            return None;
        }

        let formatted = segment(&prefixed).unwrap_or(prefixed);
        Some(CanonicalNumber(formatted))
    }
}

pub fn validate_country_code(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix('+')
        .ok_or_else(|| CoreError::InvalidCountryCode(raw.to_string()))?;
    if digits.is_empty()
        || digits.len() > MAX_COUNTRY_CODE_DIGITS
        || !digits.chars().all(|ch| ch.is_ascii_digit())
    {
        return Err(CoreError::InvalidCountryCode(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn validate_digit_bounds(min: usize, max: usize) -> Result<(), CoreError> {
    if min == 0 || min > max || max > MAX_DIGITS_LIMIT {
        return Err(CoreError::InvalidDigitBounds { min, max });
    }
    Ok(())
}

#[derive(Debug)]
struct NumberToken {
    /// `+` kept, separators dropped.
    compact: String,
    /// Lengths of `compact` at each space inside the token, ascending.
    group_ends: Vec<usize>,
    end: usize,
}

/// Returns the first token holding at least three digits.
fn first_number_token(line: &str) -> Option<NumberToken> {
    let chars: Vec<char> = line.chars().collect();
    let mut start = 0;
    while start < chars.len() {
        match scan_token(&chars, start) {
            Some(token) => {
                let digits = token.compact.chars().filter(|ch| ch.is_ascii_digit()).count();
                if digits >= MIN_TOKEN_DIGITS {
                    return Some(token);
                }
                start = token.end;
            }
            None => start += 1,
        }
    }
    None
}

// Tabs end a token. So do a `.` followed by whitespace and an unopened `)`
// followed by whitespace, which is how list markers like "1." and "2)" read.
fn scan_token(chars: &[char], start: usize) -> Option<NumberToken> {
    let mut compact = String::new();
    let mut idx = start;
    match chars.get(start) {
        Some('+') if chars.get(start + 1).is_some_and(|ch| ch.is_ascii_digit()) => {
            compact.push('+');
            idx += 1;
        }
        Some(ch) if ch.is_ascii_digit() => {}
        _ => return None,
    }

    let mut group_ends = Vec::new();
    let mut paren_open = start > 0 && chars[start - 1] == '(';
    let mut end = idx;
    while let Some(&ch) = chars.get(idx) {
        let ends_word = chars.get(idx + 1).map_or(true, |next| next.is_whitespace());
        match ch {
            '0'..='9' => {
                compact.push(ch);
                end = idx + 1;
            }
            ' ' => {
                let has_digits = compact.len() > usize::from(compact.starts_with('+'));
                if has_digits && group_ends.last() != Some(&compact.len()) {
                    group_ends.push(compact.len());
                }
            }
            '-' | '/' => {}
            '.' if !ends_word => {}
            '(' => paren_open = true,
            ')' if paren_open || !ends_word => paren_open = false,
            _ => break,
        }
        idx += 1;
    }
    group_ends.retain(|&len| len < compact.len());
    Some(NumberToken {
        compact,
        group_ends,
        end,
    })
}

fn segment(token: &str) -> Option<String> {
    let pattern = COUNTRY_PATTERNS
        .iter()
        .find(|pattern| token.starts_with(pattern.code))?;
    let digits = &token[pattern.code.len()..];
    let mut parts = vec![pattern.code];
    if split_groups(digits, pattern.groups, &mut parts) {
        Some(parts.join(" "))
    } else {
        None
    }
}

// Greedy per group, backtracking until the groups consume every digit.
fn split_groups<'a>(digits: &'a str, groups: &[DigitGroup], out: &mut Vec<&'a str>) -> bool {
    let Some((group, remaining)) = groups.split_first() else {
        return digits.is_empty();
    };
    let (min, max) = group.bounds(digits.len());
    let upper = max.min(digits.len());
    if upper < min {
        return false;
    }
    for len in (min..=upper).rev() {
        out.push(&digits[..len]);
        if split_groups(&digits[len..], remaining, out) {
            return true;
        }
        out.pop();
    }
    false
}
