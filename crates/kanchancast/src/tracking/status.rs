//! Order status derived from completion progress.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order. Always derived from progress, never set
/// on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
}

impl OrderStatus {
    /// `<= 0` is pending, `>= 100` is completed, anything between is processing.
    pub fn from_progress(progress_percent: i64) -> Self {
        if progress_percent >= 100 {
            Self::Completed
        } else if progress_percent <= 0 {
            Self::Pending
        } else {
            Self::Processing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
        }
    }

    /// Parses stored status text, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage of `total` stages that are done, rounded half up.
///
/// Returns 0 for an empty stage set.
pub fn progress_percent(done: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((done * 200 + total) / (total * 2)) as i64
}
