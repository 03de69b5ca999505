//! Rendering rows for the terminal or for export
use clap::ValueEnum;
use serde::Serialize;
use table::SilkctlTable;
use tabled::{Table, Tabled};

pub(crate) mod rows;
pub(crate) mod table;

/// Format of command output
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub(crate) enum OutputFormat {
    /// Human readable table
    Table,
    /// Comma-separated values with a header row
    Csv,
    /// A JSON array
    Json,
    /// A YAML sequence
    Yaml,
}

/// Show a single row as a two-column table of field names and values
pub(crate) fn format_one<T>(item: T) -> String
where
    T: Tabled,
{
    let mut table = Table::builder([item]).index().column(0).transpose().build();
    table.styled().to_string()
}

fn to_csv<I>(rows: I) -> anyhow::Result<String>
where
    I: Iterator,
    I::Item: Serialize,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    Ok(String::from_utf8(writer.into_inner()?)?)
}

/// Render a sequence of rows in the given format
pub(crate) fn format_seq<I>(items: I, fmt: OutputFormat) -> anyhow::Result<String>
where
    I: IntoIterator,
    I::Item: Tabled + Serialize,
{
    let rows = items.into_iter();
    Ok(match fmt {
        OutputFormat::Table => {
            let rows = rows.collect::<Vec<_>>();
            let count = rows.len();
            format!("{}\n{count} records found", Table::new(rows).styled())
        }
        OutputFormat::Csv => to_csv(rows)?,
        OutputFormat::Json => serde_json::to_string(&rows.collect::<Vec<_>>())?,
        OutputFormat::Yaml => serde_yaml::to_string(&rows.collect::<Vec<_>>())?,
    })
}
