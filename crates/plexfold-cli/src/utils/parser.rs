use crate::error::{CliError, Result};
use plexfold::engine::config::ResidueRange;

/// Parses a `START-END` focus-region argument into a one-based residue range.
pub fn parse_focus_region(spec: &str) -> Result<ResidueRange> {
    let (start, end) = spec.split_once('-').ok_or_else(|| {
        CliError::Argument(format!(
            "focus region '{spec}' must have the form START-END, e.g. 10-50"
        ))
    })?;

    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| CliError::Argument(format!("invalid focus region start '{start}'")))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|_| CliError::Argument(format!("invalid focus region end '{end}'")))?;

    ResidueRange::new(start, end).map_err(|e| CliError::Argument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_ranges_parse() {
        let region = parse_focus_region("10-50").unwrap();
        assert_eq!((region.start(), region.end()), (10, 50));

        let region = parse_focus_region(" 3 - 7 ").unwrap();
        assert_eq!((region.start(), region.end()), (3, 7));
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        assert!(matches!(
            parse_focus_region("10:50"),
            Err(CliError::Argument(_))
        ));
        assert!(matches!(
            parse_focus_region("x-50"),
            Err(CliError::Argument(_))
        ));
        assert!(matches!(
            parse_focus_region("50-10"),
            Err(CliError::Argument(_))
        ));
        assert!(matches!(
            parse_focus_region("0-10"),
            Err(CliError::Argument(_))
        ));
    }
}
