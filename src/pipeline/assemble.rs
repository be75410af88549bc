//! Row assembly: per-file extraction results → one display table.

use crate::models::{ExtractionResult, ResultTable, Schema, Value, FILE_NAME_COLUMN};

/// Build the table for a set of results, in the order given.
///
/// The `file_name` column is added only when more than one result is present.
pub fn assemble(schema: &Schema, results: &[ExtractionResult]) -> ResultTable {
    assemble_rows(schema, results, results.len() > 1)
}

/// Build the table with an explicit decision on the `file_name` column.
///
/// Columns follow the schema order, with `file_name` last. Result keys outside
/// the schema are dropped; schema fields missing from a result become null.
pub fn assemble_rows(
    schema: &Schema,
    results: &[ExtractionResult],
    include_file_name: bool,
) -> ResultTable {
    let mut columns: Vec<String> = schema.field_names().map(|n| n.trim().to_string()).collect();
    let field_count = columns.len();
    if include_file_name {
        columns.push(FILE_NAME_COLUMN.to_string());
    }

    let rows = results
        .iter()
        .map(|result| {
            let mut row: Vec<Value> = columns[..field_count]
                .iter()
                .map(|name| result.get(name).cloned().unwrap_or(Value::Null))
                .collect();
            if include_file_name {
                row.push(Value::Str(result.file_name.clone()));
            }
            row
        })
        .collect();

    ResultTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldSpec;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::new("vendor", "string"),
            FieldSpec::new("amount", "float"),
        ])
    }

    fn result(file: &str, amount: f64) -> ExtractionResult {
        let mut r = ExtractionResult::new(file);
        r.insert("amount", Value::Float(amount));
        r.insert("vendor", Value::Str(format!("vendor of {file}")));
        r
    }

    #[test]
    fn single_file_has_no_file_name_column() {
        let table = assemble(&schema(), &[result("a.pdf", 1.0)]);
        assert_eq!(table.columns, ["vendor", "amount"]);
        assert_eq!(table.len(), 1);
        assert!(!table.has_file_name_column());
    }

    #[test]
    fn multiple_files_add_file_name_last() {
        let table = assemble(&schema(), &[result("a.pdf", 1.0), result("b.pdf", 2.0)]);
        assert_eq!(table.columns, ["vendor", "amount", "file_name"]);
        assert_eq!(table.cell(0, "file_name"), Some(&Value::Str("a.pdf".into())));
        assert_eq!(table.cell(1, "file_name"), Some(&Value::Str("b.pdf".into())));
    }

    #[test]
    fn rows_follow_input_order() {
        let inputs = [result("c.pdf", 3.0), result("a.pdf", 1.0), result("b.pdf", 2.0)];
        let table = assemble(&schema(), &inputs);
        let amounts: Vec<&Value> = (0..3).map(|i| table.cell(i, "amount").unwrap()).collect();
        assert_eq!(
            amounts,
            [&Value::Float(3.0), &Value::Float(1.0), &Value::Float(2.0)]
        );
    }

    #[test]
    fn undeclared_fields_dropped_and_missing_fields_null() {
        let mut r = ExtractionResult::new("a.pdf");
        r.insert("amount", Value::Float(5.0));
        r.insert("surprise", Value::Bool(true));
        let table = assemble(&schema(), &[r]);
        assert_eq!(table.columns, ["vendor", "amount"]);
        assert_eq!(table.rows[0], [Value::Null, Value::Float(5.0)]);
    }

    #[test]
    fn explicit_file_name_decision_overrides_count() {
        let table = assemble_rows(&schema(), &[result("a.pdf", 1.0)], true);
        assert_eq!(table.columns.last().map(String::as_str), Some("file_name"));
    }

    #[test]
    fn no_results_yields_header_only() {
        let table = assemble(&schema(), &[]);
        assert!(table.is_empty());
        assert_eq!(table.columns, ["vendor", "amount"]);
    }
}
