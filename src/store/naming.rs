//! Collision-safe naming for stored entries.
//!
//! User-supplied labels are sanitized against an allow-list, then checked
//! against the target directory. On collision a random 4-digit prefix is
//! prepended until a free name is found.

use std::path::Path;

use rand::Rng;

use super::StoreError;

/// Placeholder when sanitization leaves nothing usable
const FALLBACK_NAME: &str = "untitled";

/// Upper bound on collision retries before giving up. The prefix space only
/// holds 10 000 values, so looping past it cannot make progress.
const MAX_ATTEMPTS: u32 = 10_000;

/// Replace every character outside the allow-list with a hyphen.
///
/// Allowed: unicode letters and digits, whitespace, `.`, `-`, `_`, `(`, `)`,
/// `[`, `]`.
pub fn sanitize(requested: &str) -> String {
    let cleaned: String = requested
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || "._-()[]".contains(c) {
                c
            } else {
                '-'
            }
        })
        .collect();

    let trimmed = cleaned.trim();
    // "." and ".." survive the allow-list but are not usable entry names.
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Produce a filesystem-safe, collision-free name inside `target_dir`.
///
/// Returns the sanitized name unchanged when it is free; otherwise prepends
/// `NNNN-` prefixes drawn uniformly from 0000..=9999 until a free name turns
/// up or the attempt budget runs out.
pub fn resolve(target_dir: &Path, requested: &str) -> Result<String, StoreError> {
    let base = sanitize(requested);

    if !target_dir.join(&base).exists() {
        return Ok(base);
    }

    let mut rng = rand::thread_rng();
    for _ in 0..MAX_ATTEMPTS {
        let candidate = format!("{:04}-{}", rng.gen_range(0..10_000), base);
        if !target_dir.join(&candidate).exists() {
            return Ok(candidate);
        }
    }

    Err(StoreError::NameSpaceExhausted(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_keeps_allowed_characters() {
        assert_eq!(sanitize("report.txt"), "report.txt");
        assert_eq!(sanitize("my notes_v2 (final) [1].md"), "my notes_v2 (final) [1].md");
        assert_eq!(sanitize("über-größe"), "über-größe");
    }

    #[test]
    fn test_sanitize_replaces_disallowed_characters() {
        assert_eq!(sanitize("a/b\\c:d"), "a-b-c-d");
        assert_eq!(sanitize("what?!.txt"), "what--.txt");
    }

    #[test]
    fn test_sanitize_empty_input_falls_back() {
        assert_eq!(sanitize(""), "untitled");
        assert_eq!(sanitize("   "), "untitled");
        assert_eq!(sanitize("."), "untitled");
        assert_eq!(sanitize(".."), "untitled");
    }

    #[test]
    fn test_resolve_free_name_unchanged() {
        let temp = TempDir::new().unwrap();
        let name = resolve(temp.path(), "report.txt").unwrap();
        assert_eq!(name, "report.txt");
    }

    #[test]
    fn test_resolve_collision_gets_numeric_prefix() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("report.txt"), b"taken").unwrap();

        let name = resolve(temp.path(), "report.txt").unwrap();
        assert_ne!(name, "report.txt");

        // NNNN-report.txt
        let (prefix, rest) = name.split_once('-').unwrap();
        assert_eq!(prefix.len(), 4);
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "report.txt");
    }

    #[test]
    fn test_resolve_sanitizes_before_checking() {
        let temp = TempDir::new().unwrap();
        let name = resolve(temp.path(), "a/b").unwrap();
        assert_eq!(name, "a-b");
    }
}
