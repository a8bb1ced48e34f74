//! Structural checks for generated M3U playlists

use regex::Regex;
use std::sync::OnceLock;

/// Return one message per problem found; an empty list means the playlist is well formed
///
/// Checks the `#EXTM3U` header, a non-empty `group-title` on every `#EXTINF`
/// line, and that every metadata line is matched by a URL line.
pub fn validate_m3u(content: &str) -> Vec<String> {
    static GROUP_TITLE: OnceLock<Option<Regex>> = OnceLock::new();
    let group_title = GROUP_TITLE.get_or_init(|| Regex::new(r#"group-title="[^"]+""#).ok());

    let mut errors = Vec::new();

    let first_line = content.lines().next().unwrap_or("").trim_start_matches('\u{feff}');
    if !first_line.starts_with("#EXTM3U") {
        errors.push("missing #EXTM3U header".to_string());
    }

    let mut extinf_count = 0usize;
    let mut url_count = 0usize;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("#EXTINF") {
            extinf_count += 1;
            let has_group = group_title
                .as_ref()
                .is_some_and(|re| re.is_match(line));
            if !has_group {
                errors.push(format!("line {}: missing group-title attribute", index + 1));
            }
        } else if !line.starts_with('#') {
            url_count += 1;
        }
    }

    if extinf_count != url_count {
        errors.push(format!(
            "EXTINF count ({extinf_count}) does not match URL count ({url_count})"
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_playlist() {
        let content = "#EXTM3U\n#EXTINF:-1 group-title=\"News\",CNN\nhttp://x/cnn.m3u8\n";
        assert!(validate_m3u(content).is_empty());
    }

    #[test]
    fn test_reports_every_problem() {
        let content = "#EXTINF:-1,CNN\nhttp://x/cnn.m3u8\n#EXTINF:-1 group-title=\"\",BBC\n";
        let errors = validate_m3u(content);

        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], "missing #EXTM3U header");
        assert!(errors[1].starts_with("line 1:"));
        assert!(errors[2].starts_with("line 3:"));
        assert!(errors[3].contains("(2)") && errors[3].contains("(1)"));
    }
}
