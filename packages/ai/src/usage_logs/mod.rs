// ABOUTME: API usage log module
// ABOUTME: Records every invoke attempt for auditing and stats

pub mod storage;
pub mod types;

pub use storage::UsageLogStorage;
pub use types::{ApiUsageLog, ApiUsageStats, NewUsageLog};
