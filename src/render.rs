//! Text renderers for grouped query results.
//!
//! Every renderer emits a title line, then for each group a blank line
//! followed by the group's lines. An empty result renders a blank line and a
//! format-specific `(empty)` marker instead. JSON is the exception: it
//! ignores grouping and prints one array directly under its title.

use std::ops::Range;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};
use unicode_width::UnicodeWidthStr;

use crate::backend::{ResultGroup, ResultRow, display_value};
use crate::error::DbrunError;
use crate::settings::OutputFormat;

const JSON_INDENT: &[u8] = b"    ";

/// Render `groups` with the renderer selected by `format`.
///
/// `width` is the display width available to the table renderer.
pub fn render(
    format: OutputFormat,
    title: &str,
    groups: &[ResultGroup],
    width: usize,
) -> Result<Vec<String>, DbrunError> {
    match format {
        OutputFormat::Table => Ok(render_table(title, groups, width)),
        OutputFormat::Markdown => Ok(render_markdown(title, groups)),
        OutputFormat::Csv => Ok(render_csv(title, groups)),
        OutputFormat::Json => render_json(title, groups),
    }
}

fn render_blocks<F>(
    title_line: String,
    empty_marker: &str,
    groups: &[ResultGroup],
    render_group: F,
) -> Vec<String>
where
    F: Fn(&ResultGroup) -> Vec<String>,
{
    let mut lines = vec![title_line];
    if groups.is_empty() {
        lines.push(String::new());
        lines.push(empty_marker.to_string());
        return lines;
    }
    for group in groups {
        lines.push(String::new());
        lines.extend(render_group(group));
    }
    lines
}

/// Cell texts of a group, row-major, in column order.
fn cell_texts(group: &ResultGroup) -> Vec<Vec<String>> {
    group
        .rows
        .iter()
        .map(|row| {
            group
                .columns
                .iter()
                .map(|col| display_value(row.get(col).unwrap_or(&Value::Null)))
                .collect()
        })
        .collect()
}

// --- table ---

pub fn render_table(title: &str, groups: &[ResultGroup], width: usize) -> Vec<String> {
    render_blocks(format!("=== {} ===", title), "(empty)", groups, |group| {
        table_group(group, width)
    })
}

fn pad_right(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Width of each column: the wider of its name and its longest value plus one.
fn column_widths(columns: &[String], cells: &[Vec<String>]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].width() + 1)
                .max()
                .unwrap_or(0)
                .max(name.width())
        })
        .collect()
}

/// Split columns into pages whose header line stays within `width - 1`.
/// A page always holds at least one column.
fn paginate(index_width: usize, widths: &[usize], width: usize) -> Vec<Range<usize>> {
    let limit = width.saturating_sub(1);
    let mut pages = Vec::new();
    let mut start = 0;
    let mut line_width = index_width;

    for (i, w) in widths.iter().enumerate() {
        if i > start && line_width + 1 + w > limit {
            pages.push(start..i);
            start = i;
            line_width = index_width;
        }
        line_width += 1 + w;
    }
    pages.push(start..widths.len());
    pages
}

fn table_group(group: &ResultGroup, width: usize) -> Vec<String> {
    let digits = group.rows.len().to_string().len();
    // `#` prefix plus the row number
    let index_width = digits + 1;
    let cells = cell_texts(group);
    let widths = column_widths(&group.columns, &cells);

    let mut lines = Vec::new();
    for (page_no, page) in paginate(index_width, &widths, width).into_iter().enumerate() {
        if page_no > 0 {
            lines.push(String::new());
        }

        let mut header = format!("{:>index_width$}", "#");
        let mut separator = "-".repeat(index_width);
        for col in page.clone() {
            header.push(' ');
            header.push_str(&pad_right(&group.columns[col], widths[col]));
            separator.push(' ');
            separator.push_str(&"-".repeat(widths[col]));
        }
        lines.push(header.trim_end().to_string());
        lines.push(separator);

        for (row_no, row) in cells.iter().enumerate() {
            let mut line = format!("#{:>digits$}", row_no);
            for col in page.clone() {
                line.push(' ');
                line.push_str(&pad_right(&row[col], widths[col]));
            }
            lines.push(line.trim_end().to_string());
        }
    }
    lines
}

// --- markdown ---

pub fn render_markdown(title: &str, groups: &[ResultGroup]) -> Vec<String> {
    render_blocks(format!("### {}", title), "_(empty)_", groups, |group| {
        let mut lines = vec![
            group.columns.join(" | "),
            vec![":--"; group.columns.len()].join(" | "),
        ];
        lines.extend(cell_texts(group).iter().map(|row| row.join(" | ")));
        lines
    })
}

// --- csv ---

fn csv_field(text: &str) -> String {
    format!("\"{}\"", text.replace('"', ""))
}

fn csv_line<'a>(fields: impl Iterator<Item = &'a String>) -> String {
    fields.map(|f| csv_field(f)).collect::<Vec<_>>().join(",")
}

pub fn render_csv(title: &str, groups: &[ResultGroup]) -> Vec<String> {
    render_blocks(format!("=== {} ===", title), "\"(empty)\"", groups, |group| {
        let mut lines = vec![csv_line(group.columns.iter())];
        lines.extend(cell_texts(group).iter().map(|row| csv_line(row.iter())));
        lines
    })
}

// --- json ---

/// Serialize with a fixed four-space indent.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DbrunError> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(JSON_INDENT));
    value.serialize(&mut ser).map_err(|e| DbrunError::Format {
        message: format!("cannot serialize rows: {}", e),
    })?;
    String::from_utf8(buf).map_err(|e| DbrunError::Format {
        message: format!("serialized rows are not UTF-8: {}", e),
    })
}

/// JSON ignores grouping: all rows go out as one array, in source order.
pub fn render_json(title: &str, groups: &[ResultGroup]) -> Result<Vec<String>, DbrunError> {
    let rows: Vec<&ResultRow> = groups.iter().flat_map(|g| g.rows.iter()).collect();
    let mut lines = vec![format!("/* === {} === */", title)];
    lines.extend(to_pretty_json(&rows)?.lines().map(String::from));
    Ok(lines)
}
