use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Read the newline-delimited list of selected header names.
/// Blank lines are ignored; order is preserved.
pub fn load_selected_headers<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading selected headers from {}", path.display()))?;
    Ok(parse_selected_headers(&text))
}

pub fn parse_selected_headers(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_skips_blank_lines() {
        let got = parse_selected_headers("sci\r\n\nmath\n   \nart");
        assert_eq!(got, vec!["sci", "math", "art"]);
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "math")?;
        writeln!(tmp)?;
        writeln!(tmp, "sci")?;
        assert_eq!(load_selected_headers(tmp.path())?, vec!["math", "sci"]);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_selected_headers("/no/such/headers.txt").is_err());
    }
}
