//! CSV and JSON record I/O with encoding and delimiter auto-detection.
//!
//! Delimited input is read into a header plus rows of cells; JSON input is
//! read into a list of record values. Nothing in here knows about mappings.

use serde_json::{Map, Value};
use std::path::Path;

use crate::document::value_for_path;
use crate::error::{type_name, DataError, DataResult};

/// Delimited input plus how it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvInput {
    /// Column names, empty when the input has no header row
    pub header: Vec<String>,
    /// Data rows, one cell per column
    pub rows: Vec<Vec<String>>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

impl CsvInput {
    /// Rows as JSON objects keyed by header name.
    ///
    /// Missing cells become empty strings, extra cells are dropped.
    pub fn to_objects(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .header
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let cell = row.get(i).cloned().unwrap_or_default();
                        (name.clone(), Value::String(cell))
                    })
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "iso-8859-15" | "latin-9" | "latin9" => "iso-8859-15".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings and invalid UTF-8 fall back to a lossy conversion.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::mem::decode_latin1(bytes).into_owned(),
        "iso-8859-15" | "latin-9" | "latin9" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for sep in [';', ',', '\t', '|'] {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn delimiter_byte(delimiter: char) -> DataResult<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(DataError::InvalidDelimiter(delimiter))
}

/// Parse delimited text with an explicit delimiter.
///
/// Quoted fields are unquoted, blank lines skipped, header names trimmed and
/// rows may be ragged.
pub fn read_csv(content: &str, delimiter: char, has_header: bool) -> DataResult<CsvInput> {
    if content.trim().is_empty() {
        return Err(DataError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let header = if has_header {
        reader.headers()?.iter().map(str::to_string).collect()
    } else {
        Vec::new()
    };

    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

    tracing::debug!(columns = header.len(), rows = rows.len(), delimiter = %delimiter.escape_default(), "read csv");

    Ok(CsvInput {
        header,
        rows,
        encoding: "utf-8".to_string(),
        delimiter,
    })
}

/// Parse CSV bytes with auto-detection of encoding and, when not given,
/// the delimiter.
pub fn read_csv_bytes_auto(bytes: &[u8], delimiter: Option<char>, has_header: bool) -> DataResult<CsvInput> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    tracing::debug!(encoding = %encoding, "decoded input");

    let mut input = read_csv(&content, delimiter, has_header)?;
    input.encoding = encoding;
    Ok(input)
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn read_csv_file_auto<P: AsRef<Path>>(path: P, delimiter: Option<char>, has_header: bool) -> DataResult<CsvInput> {
    let bytes = std::fs::read(path.as_ref())?;
    read_csv_bytes_auto(&bytes, delimiter, has_header)
}

/// Parse JSON records.
///
/// `records` is an optional path to the record array inside the document.
/// An array yields its elements, a single object yields one record.
pub fn read_json_records(content: &str, records: Option<&str>) -> DataResult<Vec<Value>> {
    if content.trim().is_empty() {
        return Err(DataError::EmptyFile);
    }

    let root: Value = serde_json::from_str(content)?;
    let value = match records {
        Some(path) => value_for_path(&root, path)?.clone(),
        None => root,
    };

    match value {
        Value::Array(items) => {
            if let Some(bad) = items.iter().find(|item| !item.is_object()) {
                return Err(DataError::NotRecords(type_name(bad)));
            }
            Ok(items)
        }
        obj @ Value::Object(_) => Ok(vec![obj]),
        other => Err(DataError::NotRecords(type_name(&other))),
    }
}

/// Render a header (skipped when empty) and rows as delimited text.
pub fn write_csv(header: &[String], rows: &[Vec<String>], delimiter: char) -> DataResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .flexible(true)
        .from_writer(Vec::new());

    if !header.is_empty() {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DataError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| DataError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_csv() {
        let input = read_csv("name;age\nAlice;30\nBob;25", ';', true).unwrap();

        assert_eq!(input.header, vec!["name", "age"]);
        assert_eq!(input.rows, vec![vec!["Alice", "30"], vec!["Bob", "25"]]);
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name;value\n\"Alice\";\"Hello; World\"";
        let input = read_csv(csv, ';', true).unwrap();

        assert_eq!(input.rows[0], vec!["Alice", "Hello; World"]);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let input = read_csv("a;b\n1;2\n\n3;4\n", ';', true).unwrap();
        assert_eq!(input.rows.len(), 2);
    }

    #[test]
    fn test_ragged_rows_and_objects() {
        let input = read_csv("a;b;c\n1;;3\n1;2;3;4\n5", ';', true).unwrap();
        let objects = input.to_objects();

        assert_eq!(objects[0], json!({"a": "1", "b": "", "c": "3"}));
        assert_eq!(objects[1], json!({"a": "1", "b": "2", "c": "3"}));
        assert_eq!(objects[2], json!({"a": "5", "b": "", "c": ""}));
    }

    #[test]
    fn test_without_header() {
        let input = read_csv("Tim,Test,\nTina,Test,01/01/2000\n", ',', false).unwrap();

        assert!(input.header.is_empty());
        assert_eq!(input.rows[1], vec!["Tina", "Test", "01/01/2000"]);
    }

    #[test]
    fn test_headers_are_trimmed() {
        let input = read_csv(" first_name , last_name\nTim,Test", ',', true).unwrap();
        assert_eq!(input.header, vec!["first_name", "last_name"]);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(read_csv("", ';', true), Err(DataError::EmptyFile)));
        assert!(matches!(read_csv("  \n", ';', true), Err(DataError::EmptyFile)));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        assert!(matches!(read_csv("a§b", '§', true), Err(DataError::InvalidDelimiter('§'))));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let input = read_csv_bytes_auto(b"name;age\nAlice;30\nBob;25", None, true).unwrap();

        assert_eq!(input.delimiter, ';');
        assert_eq!(input.rows.len(), 2);
        assert_eq!(input.header, vec!["name", "age"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert_eq!(decode_content(bytes, "iso-8859-1"), "Société");

        // 0xA4 is the currency sign in Latin-1 and the euro sign in Latin-9
        assert_eq!(decode_content(&[0xA4], "iso-8859-1"), "\u{a4}");
        assert_eq!(decode_content(&[0xA4], "iso-8859-15"), "€");
    }

    #[test]
    fn test_read_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "first_name,last_name\nTim,Test\n").unwrap();

        let input = read_csv_file_auto(&path, None, true).unwrap();
        assert_eq!(input.rows, vec![vec!["Tim", "Test"]]);
    }

    #[test]
    fn test_json_records() {
        let records = read_json_records(r#"[{"a": 1}, {"a": 2}]"#, None).unwrap();
        assert_eq!(records.len(), 2);

        let records = read_json_records(r#"{"user": {"first_name": "Tim"}}"#, None).unwrap();
        assert_eq!(records, vec![json!({"user": {"first_name": "Tim"}})]);

        let records = read_json_records(r#"{"data": {"items": [{"id": 1}]}}"#, Some("data.items")).unwrap();
        assert_eq!(records, vec![json!({"id": 1})]);
    }

    #[test]
    fn test_json_records_errors() {
        assert!(matches!(read_json_records("[1, 2]", None), Err(DataError::NotRecords("number"))));
        assert!(matches!(read_json_records("\"x\"", None), Err(DataError::NotRecords("string"))));
        assert!(matches!(read_json_records("{", None), Err(DataError::Json(_))));
        assert!(matches!(read_json_records("{}", Some("items")), Err(DataError::Records(_))));
    }

    #[test]
    fn test_write_csv() {
        let header = vec!["Customer DOB".to_string(), "Customer FirstName".to_string()];
        let rows = vec![
            vec!["".to_string(), "Tim".to_string()],
            vec!["01/01/2000".to_string(), "Smith, Tina".to_string()],
        ];

        let text = write_csv(&header, &rows, ',').unwrap();
        assert_eq!(
            text,
            "Customer DOB,Customer FirstName\n,Tim\n01/01/2000,\"Smith, Tina\"\n"
        );

        let text = write_csv(&[], &rows[..1], ';').unwrap();
        assert_eq!(text, ";Tim\n");
    }
}
