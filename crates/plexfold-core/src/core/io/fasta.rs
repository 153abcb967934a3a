use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker character opening a record header line.
const HEADER_MARKER: char = '>';

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("I/O error reading '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line} precedes the first record header")]
    MissingHeader { line: usize },

    #[error("Record '{header}' has no sequence lines")]
    EmptyRecord { header: String },
}

/// One raw input record: a header line (without the marker) and the
/// concatenation of all sequence lines up to the next marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub header: String,
    pub sequence: String,
}

/// Parses all records from FASTA-formatted text.
///
/// Sequence lines are concatenated verbatim apart from surrounding whitespace;
/// residue validation happens later, at component construction.
pub fn parse_str(input: &str) -> Result<Vec<FastaRecord>, FastaError> {
    let mut records: Vec<FastaRecord> = Vec::new();

    for (index, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix(HEADER_MARKER) {
            finish_record(&records)?;
            records.push(FastaRecord {
                header: header.trim().to_string(),
                sequence: String::new(),
            });
        } else {
            match records.last_mut() {
                Some(record) => record.sequence.push_str(line),
                None => return Err(FastaError::MissingHeader { line: index + 1 }),
            }
        }
    }

    finish_record(&records)?;
    Ok(records)
}

/// Reads and parses a FASTA file.
pub fn read_from_path(path: impl AsRef<Path>) -> Result<Vec<FastaRecord>, FastaError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| FastaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&content)
}

/// Writes a single-record FASTA extract for one component, returning its path.
///
/// Used to hand individual complex subunits to the external search tools.
pub fn write_single_record(
    dir: &Path,
    description: &str,
    sequence: &str,
) -> Result<PathBuf, FastaError> {
    let path = dir.join(format!("{description}.fa"));
    let mut file = fs::File::create(&path).map_err(|source| FastaError::Io {
        path: path.clone(),
        source,
    })?;
    writeln!(file, "{HEADER_MARKER}{description}").and_then(|_| writeln!(file, "{sequence}")).map_err(
        |source| FastaError::Io {
            path: path.clone(),
            source,
        },
    )?;
    Ok(path)
}

fn finish_record(records: &[FastaRecord]) -> Result<(), FastaError> {
    if let Some(last) = records.last()
        && last.sequence.is_empty()
    {
        return Err(FastaError::EmptyRecord {
            header: last.header.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiline_records() {
        let input = ">P1 first subunit\nACDE\nFGHI\n>P2\nKLMN\n";
        let records = parse_str(input).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].header, "P1 first subunit");
        assert_eq!(records[0].sequence, "ACDEFGHI");
        assert_eq!(records[1].header, "P2");
        assert_eq!(records[1].sequence, "KLMN");
    }

    #[test]
    fn blank_lines_are_ignored() {
        let records = parse_str(">P1\n\nAC\n\nDE\n").unwrap();
        assert_eq!(records[0].sequence, "ACDE");
    }

    #[test]
    fn sequence_before_any_header_is_rejected() {
        let err = parse_str("ACDE\n>P1\nFGHI\n").unwrap_err();
        assert!(matches!(err, FastaError::MissingHeader { line: 1 }));
    }

    #[test]
    fn record_without_sequence_is_rejected() {
        let err = parse_str(">P1\n>P2\nACDE\n").unwrap_err();
        assert!(matches!(err, FastaError::EmptyRecord { header } if header == "P1"));

        let err = parse_str(">P1\nACDE\n>P2\n").unwrap_err();
        assert!(matches!(err, FastaError::EmptyRecord { header } if header == "P2"));
    }

    #[test]
    fn single_record_extract_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_single_record(dir.path(), "P1", "ACDE").unwrap();

        let records = read_from_path(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header, "P1");
        assert_eq!(records[0].sequence, "ACDE");
    }
}
