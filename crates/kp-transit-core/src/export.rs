//! Tabular export of a sample sequence.
//!
//! The table has ten fixed columns ([`HEADER`]), one row per sample in input
//! order. Rendering follows the common CSV convention:
//!
//! - fields are separated by `,`
//! - a field containing `,`, `"`, `\r` or `\n` is wrapped in double quotes,
//!   with inner quotes doubled
//! - every record, the header included, ends with `\n`
//!
//! [`parse_csv`] and [`samples_from_table`] invert the rendering so an
//! exported file can be loaded and browsed again with identical values.

use serde::Serialize;

use crate::error::KpError;
use crate::models::Sample;

/// Column titles, in order.
pub const HEADER: [&str; 10] = [
    "Degree",
    "Date",
    "Time",
    "Ascendant",
    "Sign",
    "Sign Lord",
    "Nakshatra",
    "Nakshatra Lord",
    "Sub Lord",
    "Sub Sub Lord",
];

/// Header plus string rows, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRows {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn row_fields(sample: &Sample) -> [String; 10] {
    [
        sample.degree.to_string(),
        sample.date.clone(),
        sample.time.clone(),
        sample.ascendant_degree.to_string(),
        sample.sign.clone(),
        sample.sign_lord.clone(),
        sample.nakshatra.clone(),
        sample.nakshatra_lord.clone(),
        sample.sub_lord.clone(),
        sample.sub_sub_lord.clone(),
    ]
}

/// One row per sample, same order, no filtering.
pub fn to_rows<S: AsRef<Sample>>(samples: &[S]) -> TableRows {
    TableRows {
        header: HEADER.iter().map(|h| h.to_string()).collect(),
        rows: samples
            .iter()
            .map(|s| row_fields(s.as_ref()).to_vec())
            .collect(),
    }
}

fn needs_quoting(field: &str) -> bool {
    field.contains([',', '"', '\r', '\n'])
}

fn escaped_len(field: &str) -> usize {
    if needs_quoting(field) {
        field.len() + field.matches('"').count() + 2
    } else {
        field.len()
    }
}

fn push_field(out: &mut String, field: &str) {
    if needs_quoting(field) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn push_record<I, F>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = F>,
    F: AsRef<str>,
{
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field.as_ref());
    }
    out.push('\n');
}

fn record_len<I, F>(fields: I) -> usize
where
    I: IntoIterator<Item = F>,
    F: AsRef<str>,
{
    let mut len: usize = 0;
    let mut count: usize = 0;
    for field in fields {
        len += escaped_len(field.as_ref());
        count += 1;
    }
    // separators plus the terminating newline
    len + count.saturating_sub(1) + 1
}

/// Render a table as CSV text.
pub fn render_table(table: &TableRows) -> String {
    let mut out = String::new();
    push_record(&mut out, &table.header);
    for row in &table.rows {
        push_record(&mut out, row);
    }
    out
}

/// Render samples as CSV. Empty input yields the header line only.
pub fn render_csv<S: AsRef<Sample>>(samples: &[S]) -> String {
    render_table(&to_rows(samples))
}

/// Byte length of [`render_csv`] for the same input, without building it.
pub fn estimate_size<S: AsRef<Sample>>(samples: &[S]) -> usize {
    record_len(HEADER)
        + samples
            .iter()
            .map(|s| record_len(row_fields(s.as_ref())))
            .sum::<usize>()
}

/// Human-readable byte count: `"512 B"`, `"1.5 KB"`, `"2.25 MB"`.
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.2} MB", b / (KB * KB))
    }
}

/// Download name for a calculation's table.
pub fn export_file_name(date: &str, latitude: f64, longitude: f64) -> String {
    format!("ascendant_changes_{}_{}_{}.csv", date, latitude, longitude)
}

/// Parse CSV text into a header and rows.
///
/// Accepts `\n` or `\r\n` record endings; a missing final newline is
/// tolerated. Blank lines are skipped.
pub fn parse_csv(text: &str) -> Result<TableRows, KpError> {
    let mut records: Vec<(usize, Vec<String>)> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    let mut line = 1;
    let mut record_line = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    in_quotes = false;
                    match chars.peek() {
                        None | Some(',') | Some('\n') | Some('\r') => {}
                        Some(other) => {
                            return Err(KpError::MalformedTable {
                                line,
                                reason: format!("unexpected '{}' after closing quote", other),
                            })
                        }
                    }
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if !field_started => {
                in_quotes = true;
                field_started = true;
            }
            '"' => {
                return Err(KpError::MalformedTable {
                    line,
                    reason: "quote inside unquoted field".to_string(),
                })
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push((record_line, std::mem::take(&mut record)));
                } else {
                    record.clear();
                }
                line += 1;
                record_line = line;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(KpError::MalformedTable {
            line: record_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if field_started || !record.is_empty() {
        record.push(field);
        records.push((record_line, record));
    }

    let mut iter = records.into_iter();
    let (_, header) = iter.next().ok_or_else(|| KpError::MalformedTable {
        line: 1,
        reason: "missing header".to_string(),
    })?;

    let mut rows = Vec::new();
    for (line, row) in iter {
        if row.len() != header.len() {
            return Err(KpError::MalformedTable {
                line,
                reason: format!("expected {} fields, found {}", header.len(), row.len()),
            });
        }
        rows.push(row);
    }

    Ok(TableRows { header, rows })
}

fn parse_degree(value: &str, line: usize, column: &str) -> Result<f64, KpError> {
    value.trim().parse().map_err(|_| KpError::MalformedTable {
        line,
        reason: format!("{} is not a number: '{}'", column, value),
    })
}

/// Rebuild samples from a table whose header is [`HEADER`].
pub fn samples_from_table(table: &TableRows) -> Result<Vec<Sample>, KpError> {
    if table.header.len() != HEADER.len()
        || table.header.iter().zip(HEADER).any(|(got, want)| got.trim() != want)
    {
        return Err(KpError::MalformedTable {
            line: 1,
            reason: format!("unexpected header, expected: {}", HEADER.join(",")),
        });
    }

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let line = i + 2;
            if row.len() != HEADER.len() {
                return Err(KpError::MalformedTable {
                    line,
                    reason: format!("expected {} fields, found {}", HEADER.len(), row.len()),
                });
            }
            Ok(Sample {
                degree: parse_degree(&row[0], line, HEADER[0])?,
                date: row[1].clone(),
                time: row[2].clone(),
                ascendant_degree: parse_degree(&row[3], line, HEADER[3])?,
                sign: row[4].clone(),
                sign_lord: row[5].clone(),
                nakshatra: row[6].clone(),
                nakshatra_lord: row[7].clone(),
                sub_lord: row[8].clone(),
                sub_sub_lord: row[9].clone(),
                change_type: None,
            })
        })
        .collect()
}
