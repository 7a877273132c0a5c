//! Remote-name to local-name mapping for mediafire-dl
//!
//! Remote display names are attacker-ish input as far as the local
//! filesystem is concerned: they can contain separators, quotes, or anything
//! else the listing happens to carry. Every local path in the mirrored tree
//! is derived through [`normalize`], so the mapping stays a pure function of
//! the remote name.

/// Maps a remote display name to a safe local file or directory name.
///
/// Characters outside the alphanumerics and the `- _ . ` (space) set are
/// replaced with `-`. Same input always produces the same output.
pub fn normalize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_characters_pass_through() {
        assert_eq!(normalize("report_2024-final.pdf"), "report_2024-final.pdf");
        assert_eq!(normalize("My Folder"), "My Folder");
    }

    #[test]
    fn test_path_breaking_characters_are_replaced() {
        assert_eq!(normalize("a/b\\c"), "a-b-c");
        assert_eq!(normalize("disc 1: intro"), "disc 1- intro");
        assert_eq!(normalize("song (remix) [v2]"), "song -remix- -v2-");
        assert_eq!(normalize("he said \"hi\""), "he said -hi-");
    }

    #[test]
    fn test_unicode_alphanumerics_are_kept() {
        assert_eq!(normalize("café"), "café");
        assert_eq!(normalize("模型.bin"), "模型.bin");
    }

    #[test]
    fn test_deterministic() {
        let name = "weird*name?.tar.gz";
        assert_eq!(normalize(name), normalize(name));
    }

    #[test]
    fn test_output_only_contains_allowed_set() {
        let normalized = normalize("a/b:c*d?e\"f<g>h|i\0j");
        assert!(normalized
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ')));
    }
}
