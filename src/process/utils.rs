use tracing::warn;

/// A single score cell, as interpreted by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Nothing in the cell. Scored as 0 like a malformed one.
    Blank,
    /// A valid unsigned integer.
    Count(u32),
    /// Present but not an unsigned integer. Scored as 0.
    Malformed,
}

/// Trim whitespace and classify a raw cell.
pub fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Blank;
    }
    match trimmed.parse::<u32>() {
        Ok(v) => Cell::Count(v),
        Err(_) => Cell::Malformed,
    }
}

/// Parse a cell as an unsigned score, falling back to 0 with a diagnostic.
/// `context` names the cell in the log line (e.g. `"S0000001/math"`).
pub fn score_or_zero(raw: &str, context: &str) -> u32 {
    match parse_cell(raw) {
        Cell::Count(v) => v,
        Cell::Blank | Cell::Malformed => {
            warn!(cell = raw, at = context, "malformed numeric cell, treating as 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_cells() {
        assert_eq!(parse_cell("42"), Cell::Count(42));
        assert_eq!(parse_cell(" 7 "), Cell::Count(7));
        assert_eq!(parse_cell(""), Cell::Blank);
        assert_eq!(parse_cell("  "), Cell::Blank);
        assert_eq!(parse_cell("abc"), Cell::Malformed);
        assert_eq!(parse_cell("-3"), Cell::Malformed);
        assert_eq!(parse_cell("4.5"), Cell::Malformed);
        assert_eq!(parse_cell("99999999999"), Cell::Malformed);
    }

    #[test]
    fn malformed_scores_fall_back_to_zero() {
        assert_eq!(score_or_zero("12", "t"), 12);
        assert_eq!(score_or_zero("x", "t"), 0);
        assert_eq!(score_or_zero("", "t"), 0);
    }
}
