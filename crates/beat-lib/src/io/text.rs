use anyhow::{Context, Result};
use std::path::Path;

/// Parse newline-delimited floating point series, ignoring blank/comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not f64: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a newline-delimited floating point series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blanks() {
        let data = parse_f64_series("# lead II\n0.5\n\n  -1.25 \n").expect("parse");
        assert_eq!(data, vec![0.5, -1.25]);
    }

    #[test]
    fn empty_text_is_an_error() {
        assert!(parse_f64_series("# nothing\n").is_err());
    }

    #[test]
    fn bad_line_is_reported() {
        let err = parse_f64_series("1.0\nnope\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
