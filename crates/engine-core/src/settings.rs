use model::pagination::page::{DEFAULT_PAGE_SIZE, MAXIMUM_PAGE_SIZE, PageSizePolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE_ENV: &str = "KEYSET_DEFAULT_PAGE_SIZE";
pub const MAXIMUM_PAGE_SIZE_ENV: &str = "KEYSET_MAXIMUM_PAGE_SIZE";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value '{value}' for {key}: expected a positive integer")]
    InvalidNumber { key: String, value: String },

    #[error("Invalid page sizes: default {default} exceeds maximum {maximum}")]
    DefaultExceedsMaximum { default: usize, maximum: usize },
}

/// Page size configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub default_page_size: usize,
    pub maximum_page_size: usize,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            maximum_page_size: MAXIMUM_PAGE_SIZE,
        }
    }
}

impl PaginationSettings {
    /// Parses settings from JSON; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: PaginationSettings = serde_json::from_str(text)?;
        settings.validate()
    }

    /// Reads `KEYSET_DEFAULT_PAGE_SIZE` and `KEYSET_MAXIMUM_PAGE_SIZE`.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(size) = parse_size(&lookup, DEFAULT_PAGE_SIZE_ENV)? {
            settings.default_page_size = size;
        }
        if let Some(size) = parse_size(&lookup, MAXIMUM_PAGE_SIZE_ENV)? {
            settings.maximum_page_size = size;
        }
        settings.validate()
    }

    pub fn page_size_policy(&self) -> PageSizePolicy {
        PageSizePolicy::new(self.default_page_size, self.maximum_page_size)
    }

    fn validate(self) -> Result<Self, SettingsError> {
        for (key, size) in [
            ("default_page_size", self.default_page_size),
            ("maximum_page_size", self.maximum_page_size),
        ] {
            if size == 0 {
                return Err(SettingsError::InvalidNumber {
                    key: key.to_string(),
                    value: size.to_string(),
                });
            }
        }
        if self.default_page_size > self.maximum_page_size {
            return Err(SettingsError::DefaultExceedsMaximum {
                default: self.default_page_size,
                maximum: self.maximum_page_size,
            });
        }
        Ok(self)
    }
}

fn parse_size<F>(lookup: &F, key: &str) -> Result<Option<usize>, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(size) if size > 0 => Ok(Some(size)),
        _ => Err(SettingsError::InvalidNumber {
            key: key.to_string(),
            value: raw,
        }),
    }
}
