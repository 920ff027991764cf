use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base display name; each contact gets a running number appended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactName(String);

impl ContactName {
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyContactName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Base file name for generated card files. Must stay inside the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputBase(String);

impl OutputBase {
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyOutputBase);
        }
        if trimmed.contains(&['/', '\\', '\0'][..]) || trimmed.starts_with('.') {
            return Err(CoreError::InvalidOutputBase(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactName, OutputBase};
    use crate::error::CoreError;

    #[test]
    fn contact_name_trims() {
        assert_eq!(ContactName::new("  Budi ").expect("name").as_str(), "Budi");
    }

    #[test]
    fn contact_name_rejects_blank() {
        assert_eq!(ContactName::new("   "), Err(CoreError::EmptyContactName));
    }

    #[test]
    fn output_base_rejects_paths() {
        assert_eq!(OutputBase::new(""), Err(CoreError::EmptyOutputBase));
        assert!(OutputBase::new("../escape").is_err());
        assert!(OutputBase::new("a/b").is_err());
        assert!(OutputBase::new(".hidden").is_err());
        assert_eq!(OutputBase::new(" Kontak ").expect("base").as_str(), "Kontak");
    }
}
