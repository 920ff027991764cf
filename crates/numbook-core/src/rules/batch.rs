use crate::domain::CanonicalNumber;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

pub const CARD_EXTENSION: &str = "vcf";

/// Maximum number of contacts written to one card file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerFileLimit(NonZeroUsize);

impl PerFileLimit {
    pub fn new(value: usize) -> Result<Self, CoreError> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidPerFileLimit(value.to_string()))
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        let value = trimmed
            .parse::<usize>()
            .map_err(|_| CoreError::InvalidPerFileLimit(trimmed.to_string()))?;
        Self::new(value)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for PerFileLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based position in the plan.
    pub index: usize,
    pub numbers: Vec<CanonicalNumber>,
}

impl Batch {
    pub fn file_name(&self, base: &str) -> String {
        batch_file_name(base, self.index)
    }
}

pub fn batch_file_name(base: &str, index: usize) -> String {
    format!("{base} {index}.{CARD_EXTENSION}")
}

/// Splits `numbers` into contiguous batches of `limit`; only the last one may be shorter.
pub fn split_batches(numbers: Vec<CanonicalNumber>, limit: PerFileLimit) -> Vec<Batch> {
    let size = limit.get();
    let mut batches = Vec::with_capacity(numbers.len().div_ceil(size));
    let mut current = Vec::with_capacity(size.min(numbers.len()));
    for number in numbers {
        current.push(number);
        if current.len() == size {
            batches.push(Batch {
                index: batches.len() + 1,
                numbers: std::mem::take(&mut current),
            });
        }
    }
    if !current.is_empty() {
        batches.push(Batch {
            index: batches.len() + 1,
            numbers: current,
        });
    }
    batches
}

pub fn label_width(total: usize) -> usize {
    total.to_string().len()
}

/// Hands out `"{base} {n}"` display names, numbered across the whole run and
/// zero-padded to the width of the total count.
#[derive(Debug, Clone)]
pub struct ContactLabeler {
    base: String,
    width: usize,
    issued: usize,
}

impl ContactLabeler {
    pub fn new(base: &str, total: usize) -> Self {
        Self {
            base: base.to_string(),
            width: label_width(total),
            issued: 0,
        }
    }

    pub fn next_label(&mut self) -> String {
        self.issued += 1;
        format!("{} {:0width$}", self.base, self.issued, width = self.width)
    }
}
