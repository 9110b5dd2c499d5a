//! Status indicators shared by every command.

/// Success status indicator
pub const STATUS_SUCCESS: &str = "✓";

/// Informational status indicator, used for no-op and dry-run outcomes
pub const STATUS_INFO: &str = "•";

/// Error status indicator
pub const STATUS_ERROR: &str = "✗";
