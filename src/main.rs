//! csv-pull CLI - stream records out of delimited text files

use clap::Parser;
use csv_pull::encoding_rs::Encoding;
use csv_pull::{CsvReader, EscapeMode, ReaderConfig, encoding};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Streaming reader for delimited text.
///
/// Parses each file one record at a time and prints the records, a column
/// selection, or just the record count.
#[derive(Parser, Debug)]
#[command(name = "csv-pull")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file(s) to read
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Column delimiter (single character)
    #[arg(short = 'd', long, default_value = ",")]
    delimiter: char,

    /// Record delimiter (default: CR, LF or CRLF)
    #[arg(long)]
    record_delimiter: Option<char>,

    /// Text qualifier (single character, or 'none')
    #[arg(short = 'q', long, default_value = "\"")]
    quote: String,

    /// How qualifiers are escaped inside qualified columns: doubled or backslash
    #[arg(short = 'e', long, default_value = "doubled")]
    escape: EscapeMode,

    /// Skip lines that start with this character
    #[arg(short = 'c', long)]
    comment: Option<char>,

    /// Keep leading and trailing whitespace in unquoted columns
    #[arg(long)]
    no_trim: bool,

    /// Report blank lines as records
    #[arg(long)]
    keep_empty: bool,

    /// Disable the column length and column count limits
    #[arg(long)]
    no_safety: bool,

    /// Treat the first record as header names
    #[arg(long)]
    headers: bool,

    /// Only print these columns (comma-separated header names; implies --headers)
    #[arg(short = 's', long, value_delimiter = ',')]
    select: Vec<String>,

    /// Input encoding label, or 'auto' to sniff it
    #[arg(long, default_value = "utf-8")]
    encoding: String,

    /// Output format: text (default), json, or raw
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,

    /// Stop after this many records
    #[arg(short = 'n', long)]
    limit: Option<u64>,

    /// Only print the number of records
    #[arg(long)]
    count: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Raw,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut exit_code = ExitCode::SUCCESS;

    for file in &args.files {
        if let Err(e) = read_file(file, &args, &config) {
            eprintln!("Error processing {}: {}", file.display(), e);
            exit_code = ExitCode::FAILURE;
        }
    }

    exit_code
}

fn build_config(args: &Args) -> Result<ReaderConfig, Box<dyn std::error::Error>> {
    let mut config = ReaderConfig::new();
    config
        .delimiter(args.delimiter)
        .escape_mode(args.escape)
        .trim_whitespace(!args.no_trim)
        .skip_empty_records(!args.keep_empty)
        .safety_switch(!args.no_safety)
        .capture_raw_record(args.format == OutputFormat::Raw);

    if let Some(record_delimiter) = args.record_delimiter {
        config.record_delimiter(record_delimiter);
    }

    if args.quote.eq_ignore_ascii_case("none") {
        config.use_text_qualifier(false);
    } else {
        let mut chars = args.quote.chars();
        match (chars.next(), chars.next()) {
            (Some(q), None) => {
                config.text_qualifier(q);
            }
            _ => {
                return Err(
                    format!("quote must be one character or 'none', got {:?}", args.quote).into(),
                );
            }
        }
    }

    if let Some(comment) = args.comment {
        config.comment(comment).use_comments(true);
    }

    Ok(config)
}

fn resolve_encoding(path: &Path, label: &str) -> csv_pull::Result<&'static Encoding> {
    if label.eq_ignore_ascii_case("auto") {
        encoding::sniff_path(path)
    } else {
        encoding::for_label(label)
    }
}

fn read_file(
    path: &Path,
    args: &Args,
    config: &ReaderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let encoding = resolve_encoding(path, &args.encoding)?;
    let mut reader = CsvReader::from_path(path, encoding)?.with_config(config.clone());

    if args.headers || !args.select.is_empty() {
        reader.read_headers()?;
    }

    let mut selection = Vec::with_capacity(args.select.len());
    for name in &args.select {
        match reader.index_of(name)? {
            Some(index) => selection.push(index),
            None => return Err(format!("no column named {name:?}").into()),
        }
    }

    let mut printed = 0u64;
    while args.limit.is_none_or(|limit| printed < limit) && reader.read_record()? {
        printed += 1;
        if args.count {
            continue;
        }

        let values = if selection.is_empty() {
            reader.values()?
        } else {
            selection
                .iter()
                .map(|&i| reader.get(i).map(str::to_string))
                .collect::<csv_pull::Result<Vec<_>>>()?
        };

        match args.format {
            OutputFormat::Text => println!("{}", values.join(" | ")),
            OutputFormat::Json => print_json_record(&reader, &values, &selection)?,
            OutputFormat::Raw => println!("{}", reader.raw_record()?),
        }
    }

    if args.count {
        println!("{}: {}", path.display(), printed);
    }

    reader.close();
    Ok(())
}

fn print_json_record(
    reader: &CsvReader,
    values: &[String],
    selection: &[usize],
) -> csv_pull::Result<()> {
    let mut line = String::from("{");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        let index = selection.get(i).copied().unwrap_or(i);
        let name = match reader.header(index)? {
            "" => format!("{index}"),
            header => header.to_string(),
        };
        line.push_str(&format!("{}:{}", json_string(&name), json_string(value)));
    }
    line.push('}');
    println!("{line}");
    Ok(())
}

/// Quote `s` as a JSON string literal.
fn json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
