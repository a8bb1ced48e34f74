/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Performance defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_THREADS: usize = 4;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

// Source defaults
pub const DEFAULT_SOURCE_PRIORITY: i32 = 50;

// Filter defaults
pub const DEFAULT_MIN_DURATION: i64 = 0;
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[".m3u8", ".ts", ".flv", ".mp4"];

// Catchup injection defaults
pub const DEFAULT_CATCHUP_DAYS: u32 = 3;
pub const DEFAULT_CATCHUP_TEMPLATE: &str = "playseek={utc}-{utcend}";

// Detection defaults
pub const DEFAULT_DETECTION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TEMPLATE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_SNIFF_BYTES: usize = 512;
pub const DEFAULT_DETECTION_WORKERS: usize = 4;

// Output defaults
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "outputs";
pub const DEFAULT_RESTRICTED_FILE: &str = "tvbox.m3u";
pub const DEFAULT_FULL_FILE: &str = "full.m3u";
pub const DEFAULT_TEXT_FILE: &str = "simple.txt";
pub const DEFAULT_CATCHUP_REPORT_FILE: &str = "catchup.json";
