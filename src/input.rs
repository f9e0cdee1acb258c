//! Line-oriented URL lists.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Reads one URL per line from `path`.
pub fn read_input_urls(path: &Path) -> io::Result<Vec<String>> {
    let raw = fs::read_to_string(path)?;
    let urls = parse_url_list(&raw);
    if urls.is_empty() {
        warn!(path = %path.display(), "no URLs found");
    } else {
        info!(path = %path.display(), count = urls.len(), "loaded URLs");
    }
    Ok(urls)
}

/// Trimmed lines of `raw`, skipping blanks and `#` comments. Duplicates are kept.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn skips_blank_and_comment_lines() {
        let raw = "# seeds\n\n  https://a.test/1  \r\n\t\n#https://skipped.test\nhttps://b.test/2\nhttps://a.test/1\n";
        assert_eq!(
            parse_url_list(raw),
            vec!["https://a.test/1", "https://b.test/2", "https://a.test/1"]
        );
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.txt");
        fs::write(&path, "https://a.test/1\n# done\n").unwrap();
        assert_eq!(read_input_urls(&path).unwrap(), vec!["https://a.test/1"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input_urls(&dir.path().join("absent.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
