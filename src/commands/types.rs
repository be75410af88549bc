use crate::models::ValueType;
use crate::pipeline::schema::{format_hint, EDITOR_LABELS};

use super::CommandError;

/// Lines printed by `pdf-rows types`.
pub fn describe_types() -> Vec<String> {
    let mut lines = vec!["Editor labels:".to_string()];
    for (label, ty) in EDITOR_LABELS {
        lines.push(format!("  {label:<14} -> {ty}"));
    }

    lines.push(String::new());
    lines.push("Schema file types:".to_string());
    for ty in ValueType::ALL {
        match format_hint(ty) {
            Some(hint) => lines.push(format!("  {:<14} ({hint})", ty.as_str())),
            None => lines.push(format!("  {}", ty.as_str())),
        }
    }
    lines
}

pub fn run() -> Result<(), CommandError> {
    for line in describe_types() {
        println!("{line}");
    }
    Ok(())
}
