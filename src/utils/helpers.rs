//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Utc, Duration};
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]").expect("static regex"))
}

fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

/// Milliseconds since the Unix epoch
pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format a timestamp for user display (relative time)
pub fn format_relative_time(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let diff = now.signed_duration_since(timestamp);

    if diff < Duration::minutes(1) {
        "just now".to_string()
    } else if diff < Duration::hours(1) {
        format!("{} minutes ago", diff.num_minutes())
    } else if diff < Duration::days(1) {
        format!("{} hours ago", diff.num_hours())
    } else if diff < Duration::weeks(1) {
        format!("{} days ago", diff.num_days())
    } else {
        format_timestamp(timestamp)
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Lower-case a name and replace everything outside `[a-z0-9]` with `_`
pub fn sanitize_file_stem(name: &str) -> String {
    let lowered = name.to_lowercase();
    let sanitized = non_alphanumeric().replace_all(&lowered, "_").to_string();
    if sanitized.is_empty() {
        "label".to_string()
    } else {
        sanitized
    }
}

/// Build a unit code such as `CAM-001-AB12`.
///
/// `base` is the SKU when present, otherwise the first three letters of the
/// equipment name upper-cased; `index` is 1-based.
pub fn generate_unit_code(base: &str, index: usize) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("{}-{:03}-{}", base, index, suffix)
}

/// Derive the code prefix for the units of an equipment template
pub fn unit_code_base(name: &str, sku: Option<&str>) -> String {
    match sku.map(str::trim).filter(|s| !s.is_empty()) {
        Some(sku) => sku.to_string(),
        None => name.chars().take(3).collect::<String>().to_uppercase(),
    }
}

/// Normalize an email address for storage and lookup
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    if email_pattern().is_match(&email) {
        Some(email)
    } else {
        None
    }
}

/// File extension for an uploaded image, from its content type
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

/// Guess the content type of a photo from its file name
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Sony FX3 (Body)"), "sony_fx3__body_");
        assert_eq!(sanitize_file_stem("mic"), "mic");
        assert_eq!(sanitize_file_stem(""), "label");
    }

    #[test]
    fn test_generate_unit_code_shape() {
        let code = generate_unit_code("CAM", 1);
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CAM");
        assert_eq!(parts[1], "001");
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_unit_code_base() {
        assert_eq!(unit_code_base("Camera", None), "CAM");
        assert_eq!(unit_code_base("Camera", Some("  ")), "CAM");
        assert_eq!(unit_code_base("Camera", Some("FX3")), "FX3");
        assert_eq!(unit_code_base("Tv", None), "TV");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Alex@Studio.IO "), Some("alex@studio.io".to_string()));
        assert_eq!(normalize_email("not-an-email"), None);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a very long equipment name", 10), "a very ...");
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for_path(Path::new("a/b.PNG")), "image/png");
        assert_eq!(content_type_for_path(Path::new("photo")), "image/jpeg");
        assert_eq!(extension_for_content_type("image/png"), "png");
        assert_eq!(extension_for_content_type("image/jpeg"), "jpg");
    }
}
