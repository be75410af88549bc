use serde::Serialize;
use uuid::Uuid;

use crate::models::ResultTable;
use crate::pipeline::processor::{ExtractionOutcome, FailureSummary};

use super::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(CommandError::UnknownOutput(other.to_string())),
        }
    }
}

/// Render the table as aligned plain-text columns.
pub fn format_table(table: &ResultTable) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push(format_line(&table.columns, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        lines.push(format_line(row, &widths));
    }
    lines.join("\n")
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    run_id: Uuid,
    rows: &'a ResultTable,
    failures: Vec<FailureSummary>,
}

/// JSON document: `{"run_id": ..., "rows": [...], "failures": [...]}`.
pub fn format_json(outcome: &ExtractionOutcome) -> Result<String, CommandError> {
    let report = JsonReport {
        run_id: outcome.run_id,
        rows: &outcome.table,
        failures: outcome.failures.iter().map(FailureSummary::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use crate::pipeline::extraction::ExtractionError;
    use crate::pipeline::processor::FileFailure;

    fn table() -> ResultTable {
        ResultTable {
            columns: vec!["vendor".into(), "amount".into()],
            rows: vec![
                vec![Value::Str("ACME Corporation".into()), Value::Float(42.5)],
                vec![Value::Null, Value::Int(7)],
            ],
        }
    }

    #[test]
    fn table_columns_align() {
        let text = format_table(&table());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "vendor            amount");
        assert_eq!(lines[1], "----------------  ------");
        assert_eq!(lines[2], "ACME Corporation  42.5");
        assert_eq!(lines[3], "null              7");
    }

    #[test]
    fn json_includes_rows_and_failures() {
        let outcome = ExtractionOutcome {
            run_id: Uuid::nil(),
            table: table(),
            failures: vec![FileFailure {
                file_name: "b.pdf".into(),
                error: ExtractionError::Parse("not json".into()),
            }],
            duration_ms: 10,
        };
        let json: serde_json::Value = serde_json::from_str(&format_json(&outcome).unwrap()).unwrap();
        assert_eq!(json["rows"][0]["amount"], 42.5);
        assert_eq!(json["rows"][1]["vendor"], serde_json::Value::Null);
        assert_eq!(json["failures"][0]["file_name"], "b.pdf");
        assert_eq!(json["failures"][0]["kind"], "parse");
    }

    #[test]
    fn output_format_parses() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!(matches!(
            "csv".parse::<OutputFormat>(),
            Err(CommandError::UnknownOutput(_))
        ));
    }
}
