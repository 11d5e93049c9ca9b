//! Parsing of a user-supplied folder reference for the mirror root.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{DriveError, Result};

/// Alias Drive accepts for the principal's My Drive root.
pub const ROOT_ALIAS: &str = "root";

static FOLDER_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/drive/(?:u/\d+/)?folders/([a-zA-Z0-9_-]+)")
        .expect("Invalid folder URL regex")
});

static MY_DRIVE_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/drive/(?:u/\d+/)?my-drive/?(?:[?#].*)?$")
        .expect("Invalid my-drive URL regex")
});

static OPEN_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/open\?id=([a-zA-Z0-9_-]+)")
        .expect("Invalid open URL regex")
});

static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid ID regex"));

/// Resolve a folder URL, the `root` alias, a My Drive URL or a raw id to a
/// folder id usable as a parent.
///
/// ```
/// use drive_keeper::folder_ref::parse_folder_ref;
///
/// let id = parse_folder_ref("https://drive.google.com/drive/folders/1abc123").unwrap();
/// assert_eq!(id, "1abc123");
/// assert_eq!(parse_folder_ref("https://drive.google.com/drive/my-drive").unwrap(), "root");
/// ```
pub fn parse_folder_ref(input: &str) -> Result<String> {
    let trimmed = input.trim();

    if MY_DRIVE_URL_REGEX.is_match(trimmed) || trimmed.eq_ignore_ascii_case(ROOT_ALIAS) {
        return Ok(ROOT_ALIAS.to_string());
    }

    for regex in [&*FOLDER_URL_REGEX, &*OPEN_URL_REGEX] {
        if let Some(id) = regex.captures(trimmed).and_then(|c| c.get(1)) {
            return Ok(id.as_str().to_string());
        }
    }

    if ID_REGEX.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(DriveError::InvalidUrlOrId(input.to_string()))
}
