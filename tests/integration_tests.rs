//! Integration tests for csv-pull

use csv_pull::encoding_rs::{UTF_8, WINDOWS_1252};
use csv_pull::{CsvError, CsvReader, EscapeMode, MAX_COLUMN_LENGTH, ReaderConfig};
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn read_all(reader: &mut CsvReader) -> Vec<Vec<String>> {
    reader.records().collect::<csv_pull::Result<_>>().unwrap()
}

fn temp_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_headers_then_records() {
    let mut reader = CsvReader::from_text("id,name\n1,\"Alice, A\"\n2,Bob\n");

    assert!(reader.read_headers().unwrap());
    assert_eq!(
        reader.headers().unwrap(),
        Some(vec!["id".to_string(), "name".to_string()])
    );

    assert!(reader.read_record().unwrap());
    assert_eq!(reader.values().unwrap(), vec!["1", "Alice, A"]);
    assert!(reader.is_qualified(1).unwrap());

    assert!(reader.read_record().unwrap());
    assert_eq!(reader.values().unwrap(), vec!["2", "Bob"]);
    assert!(!reader.is_qualified(1).unwrap());

    assert!(!reader.read_record().unwrap());
}

#[test]
fn test_backslash_escape_without_qualifier() {
    let mut config = ReaderConfig::new();
    config
        .escape_mode(EscapeMode::Backslash)
        .use_text_qualifier(false);
    let mut reader = CsvReader::from_text("a\\tb,c\n").with_config(config);

    assert!(reader.read_record().unwrap());
    assert_eq!(reader.get(0).unwrap(), "a\tb");
    assert_eq!(reader.get(1).unwrap(), "c");
}

#[test]
fn test_backslash_complex_escapes() {
    let mut config = ReaderConfig::new();
    config.escape_mode(EscapeMode::Backslash);
    let mut reader =
        CsvReader::from_text("\"\\u0041\\x42\\o103\\d068\\105\",\\n\\\\\n").with_config(config);

    // Unquoted backslashes are only escapes when the qualifier is disabled
    assert!(reader.read_record().unwrap());
    assert_eq!(reader.values().unwrap(), vec!["ABCDE", "\\n\\\\"]);
}

#[test]
fn test_unicode_escape_surrogate_pair() {
    for capacity in [1, 2, 3, 7, 1024] {
        let mut config = ReaderConfig::new();
        config.escape_mode(EscapeMode::Backslash);
        let mut reader = CsvReader::from_text("\"\\uD83D\\uDE00\"\n")
            .with_config(config)
            .with_chunk_capacity(capacity);

        assert!(reader.read_record().unwrap());
        assert_eq!(reader.get(0).unwrap(), "😀", "capacity {capacity}");
    }
}

#[test]
fn test_backslash_after_closing_qualifier_is_discarded() {
    let mut config = ReaderConfig::new();
    config.escape_mode(EscapeMode::Backslash);
    let mut reader = CsvReader::from_text("\"ab\"\\x41,c\n").with_config(config);

    assert!(reader.read_record().unwrap());
    assert_eq!(reader.values().unwrap(), vec!["ab", "c"]);
}

#[test]
fn test_comment_lines_are_skipped() {
    let mut config = ReaderConfig::new();
    config.use_comments(true);
    let mut reader = CsvReader::from_text("# comment\na,b\n").with_config(config);

    assert!(reader.read_record().unwrap());
    assert_eq!(reader.values().unwrap(), vec!["a", "b"]);
    assert!(!reader.read_record().unwrap());
}

#[test]
fn test_empty_record_skipping() {
    let mut reader = CsvReader::from_text("a,b\n\n\nc,d\n");
    assert_eq!(read_all(&mut reader).len(), 2);

    let mut config = ReaderConfig::new();
    config.skip_empty_records(false);
    let mut reader = CsvReader::from_text("a,b\n\n\nc,d\n").with_config(config);
    let rows = read_all(&mut reader);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1], vec![""]);
    assert_eq!(rows[3], vec!["c", "d"]);
}

#[test]
fn test_header_duplicates_use_last_index() {
    let mut reader = CsvReader::from_text("a,b,a\n1,2,3\n");
    reader.read_headers().unwrap();

    assert_eq!(reader.index_of("a").unwrap(), Some(2));
    assert_eq!(reader.header_count().unwrap(), 3);

    reader.read_record().unwrap();
    assert_eq!(reader.get_by_name("a").unwrap(), "3");
}

#[test]
fn test_safety_switch_column_length() {
    init_logging();
    let long = "x".repeat(MAX_COLUMN_LENGTH + 1);

    let mut reader = CsvReader::from_text(format!("{long}\n"));
    let err = reader.read_record().unwrap_err();
    assert!(err.is_limit_exceeded());
    assert!(reader.is_closed());

    let mut config = ReaderConfig::new();
    config.safety_switch(false);
    let mut reader = CsvReader::from_text(format!("{long}\n")).with_config(config);
    assert!(reader.read_record().unwrap());
    assert_eq!(reader.get(0).unwrap().len(), MAX_COLUMN_LENGTH + 1);
}

#[test]
fn test_safety_switch_column_count() {
    init_logging();
    let line = format!("{}\n", ",".repeat(100_000));

    let mut reader = CsvReader::from_text(line.clone());
    assert!(matches!(
        reader.read_record(),
        Err(CsvError::ColumnCountExceeded { .. })
    ));
    assert!(matches!(reader.read_record(), Err(CsvError::Closed)));

    let mut config = ReaderConfig::new();
    config.safety_switch(false);
    let mut reader = CsvReader::from_text(line).with_config(config);
    assert!(reader.read_record().unwrap());
    assert_eq!(reader.column_count().unwrap(), 100_001);
}

#[test]
fn test_close_is_idempotent() {
    let mut reader = CsvReader::from_text("a\n");
    reader.read_record().unwrap();
    reader.close();
    reader.close();

    assert!(reader.is_closed());
    assert!(matches!(reader.get(0), Err(CsvError::Closed)));
    assert!(matches!(reader.raw_record(), Err(CsvError::Closed)));
    assert!(matches!(reader.header(0), Err(CsvError::Closed)));
    assert!(matches!(reader.skip_line(), Err(CsvError::Closed)));
    assert!(matches!(
        reader.current_record_index(),
        Err(CsvError::Closed)
    ));
}

#[test]
fn test_read_from_path() {
    let file = temp_file(b"name,city\nAlice,Paris\nBob,\"New\nYork\"\n");
    let mut reader = CsvReader::from_path(file.path(), UTF_8).unwrap();

    reader.read_headers().unwrap();
    let rows = read_all(&mut reader);
    assert_eq!(rows, vec![vec!["Alice", "Paris"], vec!["Bob", "New\nYork"]]);
}

#[test]
fn test_missing_file_is_rejected_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");

    assert!(matches!(
        CsvReader::from_path(&path, UTF_8),
        Err(CsvError::FileNotFound(p)) if p == path
    ));
}

#[test]
fn test_file_is_opened_lazily() {
    init_logging();
    let file = temp_file(b"a,b\n");
    let path = file.path().to_path_buf();
    let mut reader = CsvReader::from_path(&path, UTF_8).unwrap();

    // Removing the file before the first read makes the deferred open fail
    file.close().unwrap();

    assert!(matches!(reader.read_record(), Err(CsvError::Io(_))));
    assert!(reader.is_closed());
}

#[test]
fn test_windows_1252_file() {
    let file = temp_file(b"caf\xe9,na\xefve\n");
    let mut reader = CsvReader::from_path(file.path(), WINDOWS_1252).unwrap();

    assert!(reader.read_record().unwrap());
    assert_eq!(reader.values().unwrap(), vec!["café", "naïve"]);
}

#[test]
fn test_utf16_bom_overrides_encoding() {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "x,ü\n".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let mut reader = CsvReader::from_reader(Cursor::new(bytes));

    assert!(reader.read_record().unwrap());
    assert_eq!(reader.values().unwrap(), vec!["x", "ü"]);
}

#[test]
fn test_sniffed_encoding_reads_file() {
    let file = temp_file("é,ü\n".as_bytes());
    let encoding = csv_pull::encoding::sniff_path(file.path()).unwrap();
    assert_eq!(encoding, UTF_8);

    let mut reader = CsvReader::from_path(file.path(), encoding).unwrap();
    assert_eq!(read_all(&mut reader), vec![vec!["é", "ü"]]);
}

#[test]
fn test_raw_record_capture() {
    let mut config = ReaderConfig::new();
    config.capture_raw_record(true);
    let mut reader = CsvReader::from_text("a, \"b,c\" ,d\r\nnext\n")
        .with_config(config)
        .with_chunk_capacity(3);

    assert!(reader.read_record().unwrap());
    assert_eq!(reader.values().unwrap(), vec!["a", "b,c", "d"]);
    assert_eq!(reader.raw_record().unwrap(), "a, \"b,c\" ,d");

    assert!(reader.read_record().unwrap());
    assert_eq!(reader.raw_record().unwrap(), "next");
}

#[test]
fn test_custom_record_delimiter() {
    let mut config = ReaderConfig::new();
    config.record_delimiter(';');
    let mut reader = CsvReader::from_text("a,b;c,\"d;e\";").with_config(config);

    assert_eq!(read_all(&mut reader), vec![vec!["a", "b"], vec!["c", "d;e"]]);
}

#[test]
fn test_skip_line_and_skip_record() {
    let mut reader = CsvReader::from_text("preamble, with \"junk\nh1,h2\n1,2\n3,4\n");

    assert!(reader.skip_line().unwrap());
    reader.read_headers().unwrap();
    assert!(reader.skip_record().unwrap());
    assert!(reader.read_record().unwrap());
    assert_eq!(reader.get_by_name("h2").unwrap(), "4");
    assert_eq!(reader.current_record_index().unwrap(), Some(0));
}

#[test]
fn test_chunk_capacity_does_not_change_results() {
    let text = "  x , \"y\"\"z\" ,\r\n\"multi\nline\",tail  \n,,\n";
    let expected = read_all(&mut CsvReader::from_text(text));
    assert_eq!(
        expected,
        vec![
            vec!["x", "y\"z", ""],
            vec!["multi\nline", "tail"],
            vec!["", "", ""],
        ]
    );

    for capacity in 1..=12 {
        let mut reader = CsvReader::from_text(text).with_chunk_capacity(capacity);
        assert_eq!(read_all(&mut reader), expected, "capacity {capacity}");
    }
}

#[test]
fn test_config_is_frozen_after_first_read() {
    init_logging();
    let mut reader = CsvReader::from_text("a|b\n");
    reader.config_mut().unwrap().delimiter('|');
    reader.read_record().unwrap();

    assert!(matches!(
        reader.config_mut(),
        Err(CsvError::InvalidConfig(_))
    ));
    let reader = reader.with_delimiter(',');
    assert_eq!(reader.config().unwrap().delimiter, '|');
}
