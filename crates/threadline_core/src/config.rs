//! Engine tunables.
//!
//! # Responsibility
//! - Hold the page size used by the tree assembler.
//! - Hold the mutability window applied on create and edit.
//!
//! # Invariants
//! - `page_size` is at least 1.
//! - `edit_window_ms` is strictly positive.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Top-level comments returned per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Mutability window in epoch milliseconds (15 minutes).
pub const DEFAULT_EDIT_WINDOW_MS: i64 = 15 * 60 * 1000;

/// Runtime configuration shared by comment services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadConfig {
    /// Number of top-level comments per page.
    pub page_size: u32,
    /// How long a comment stays mutable after creation or last edit.
    pub edit_window_ms: i64,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            edit_window_ms: DEFAULT_EDIT_WINDOW_MS,
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroPageSize,
    NonPositiveEditWindow(i64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroPageSize => write!(f, "page_size must be at least 1"),
            Self::NonPositiveEditWindow(value) => {
                write!(f, "edit_window_ms must be positive, got {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl ThreadConfig {
    /// Checks that both tunables are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.edit_window_ms <= 0 {
            return Err(ConfigError::NonPositiveEditWindow(self.edit_window_ms));
        }
        Ok(())
    }

    /// Deadline for a comment created or edited at `now_ms`.
    pub fn deadline_from(&self, now_ms: i64) -> i64 {
        now_ms.saturating_add(self.edit_window_ms)
    }

    /// Row offset of the first top-level comment on a 1-based page.
    pub fn page_offset(&self, page: u32) -> u64 {
        u64::from(page.max(1) - 1) * u64::from(self.page_size)
    }
}
