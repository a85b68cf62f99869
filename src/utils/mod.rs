//! Utility modules for validation, formatting, error handling and configuration

pub mod config;
pub mod error;
pub mod format;
pub mod platform;
pub mod url;

// Re-export for convenience
pub use config::{ServerSettings, ToolTimeouts};
pub use error::{Result, SocialSaveError};
pub use format::{format_duration, format_file_size, format_optional_size, UNKNOWN};
pub use platform::{detect_platform, Platform};
pub use url::{is_valid_url, parse_url};
