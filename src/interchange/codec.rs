//! RFC4180 reading and writing on top of the `csv` crate. Quoted fields may
//! contain commas and newlines; doubled quotes unescape to a literal quote.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV file must contain a header row and at least one data row")]
    TooShort,
    #[error("CSV parse failure: {0}")]
    Malformed(#[from] csv::Error),
}

/// Format one record as a single CSV line, without a trailing record
/// terminator. Writing to an in-memory buffer cannot fail for UTF-8 input;
/// a formatter error yields an empty line.
pub fn format_csv_line(fields: &[String]) -> String {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if writer.write_record(fields).is_err() {
        return String::new();
    }
    match writer.into_inner() {
        Ok(bytes) => {
            let mut line = String::from_utf8_lossy(&bytes).into_owned();
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            line
        }
        Err(_) => String::new(),
    }
}

/// Parse one CSV record. The input may span multiple physical lines when a
/// quoted field embeds a newline.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(|f| f.to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Parse a whole CSV document into one map per data row, keyed by header
/// name. The header row defines field order; short rows pad with the empty
/// string. Requires at least one data row after the header.
pub fn parse_csv_content(text: &str) -> Result<Vec<HashMap<String, String>>, CsvError> {
    if text.trim().is_empty() {
        return Err(CsvError::TooShort);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            row.insert(header.clone(), record.get(i).unwrap_or("").to_string());
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(CsvError::TooShort);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_util;

    #[test]
    fn format_then_parse_round_trips_quoting() {
        test_util::setup();
        let fields = vec![
            "a,b".to_string(),
            "He said \"hi\"".to_string(),
            "line1\nline2".to_string(),
        ];
        let line = format_csv_line(&fields);
        assert_eq!(parse_csv_line(&line), fields);
    }

    #[test]
    fn plain_fields_stay_unquoted() {
        let line = format_csv_line(&["one".to_string(), "two".to_string()]);
        assert_eq!(line, "one,two");
    }

    #[test]
    fn doubled_quotes_unescape() {
        let parsed = parse_csv_line(r#""say ""go""",next"#);
        assert_eq!(parsed, vec!["say \"go\"".to_string(), "next".to_string()]);
    }

    #[test]
    fn content_requires_a_data_row() {
        assert!(matches!(
            parse_csv_content("name,code\n"),
            Err(CsvError::TooShort)
        ));
        assert!(matches!(parse_csv_content(""), Err(CsvError::TooShort)));
    }

    #[test]
    fn content_keys_rows_by_header() {
        let rows = parse_csv_content("name,code\nAcme,AC1\nBeta,B2\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Acme");
        assert_eq!(rows[1]["code"], "B2");
    }

    #[test]
    fn short_rows_pad_with_empty_string() {
        let rows = parse_csv_content("name,code,logo\nAcme,AC1\n").unwrap();
        assert_eq!(rows[0]["logo"], "");
    }

    #[test]
    fn quoted_newline_does_not_split_a_row() {
        let rows = parse_csv_content("name,notes\nAcme,\"first\nsecond\"\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["notes"], "first\nsecond");
    }
}
