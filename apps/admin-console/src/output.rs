use std::fmt;

use adminkit_sdk::ResourceState;
use anyhow::{Context, Result};
use serde::Serialize;

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub const fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

/// Print `value` as pretty JSON, or as the text produced by `text`.
///
/// # Errors
/// Only if JSON serialization fails.
pub fn emit<T, F>(format: Format, value: &T, text: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match format {
        Format::Json => {
            let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
            println!("{json}");
        }
        Format::Text => println!("{}", text(value)),
    }
    Ok(())
}

/// Data of a settled store, or its error as a command failure.
///
/// # Errors
/// Returns the fetch error message recorded in `state`.
pub fn settled<T>(state: ResourceState<T>) -> Result<T> {
    if let Some(message) = state.error {
        anyhow::bail!(message);
    }
    state.data.context("no data returned")
}

/// Left-aligned plain-text table.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        let write_line = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let mut line = String::new();
            for (i, width) in widths.iter().enumerate() {
                let cell = cells.get(i).map_or("", String::as_str);
                if i > 0 {
                    line.push_str("  ");
                }
                line.push_str(cell);
                line.extend(std::iter::repeat_n(' ', width.saturating_sub(cell.chars().count())));
            }
            writeln!(f, "{}", line.trim_end())
        };

        write_line(f, &self.headers)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_line(f, &rule)?;
        if self.rows.is_empty() {
            return writeln!(f, "(no results)");
        }
        for row in &self.rows {
            write_line(f, row)?;
        }
        Ok(())
    }
}

/// `-` for absent values.
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

/// Footer line under a paginated listing.
pub fn page_footer(page: u32, total_pages: u32, total: u64) -> String {
    format!("page {page}/{total_pages} ({total} total)")
}
