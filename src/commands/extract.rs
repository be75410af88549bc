use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{load_credentials, ExtractorConfig, RATE_LIMIT_NOTICE};
use crate::pipeline::extraction::GeminiExtractor;
use crate::pipeline::processor::{ExtractionOutcome, Processor};
use crate::pipeline::schema::{parse_schema_json, FormatStyle};
use crate::session::SessionState;

use super::output::{format_json, format_table, OutputFormat};
use super::CommandError;

/// Inputs of `pdf-rows extract`. `None` keeps the configured value.
#[derive(Debug, Clone)]
pub struct ExtractArgs {
    pub schema: PathBuf,
    pub files: Vec<PathBuf>,
    pub format_style: Option<FormatStyle>,
    pub model: Option<String>,
    pub jobs: Option<usize>,
    pub fail_fast: bool,
    pub output: String,
}

impl ExtractArgs {
    /// Layer command-line overrides over the environment-derived config.
    pub fn apply_to(&self, mut config: ExtractorConfig) -> ExtractorConfig {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(style) = self.format_style {
            config.format_style = style;
        }
        if let Some(jobs) = self.jobs {
            config.max_workers = jobs.max(1);
        }
        config.fail_fast |= self.fail_fast;
        config
    }
}

pub fn run(args: ExtractArgs) -> Result<(), CommandError> {
    let format: OutputFormat = args.output.parse()?;
    let config = args.apply_to(ExtractorConfig::from_env()?);
    let credentials = load_credentials()?;

    let schema_text = std::fs::read_to_string(&args.schema).map_err(|source| CommandError::Io {
        path: args.schema.clone(),
        source,
    })?;
    let schema = parse_schema_json(&schema_text)?;

    let mut session = SessionState::new();
    for path in &args.files {
        session.upload_path(path)?;
    }
    session.set_schema(schema);

    let extractor = Arc::new(GeminiExtractor::from_config(&config)?);
    let processor = Processor::new(extractor, credentials, config.processor_options());

    let outcome = session.extract(&processor)?;
    report(outcome, format)
}

fn report(outcome: &ExtractionOutcome, format: OutputFormat) -> Result<(), CommandError> {
    match format {
        OutputFormat::Table => {
            if !outcome.table.is_empty() {
                println!("{}", format_table(&outcome.table));
            }
        }
        OutputFormat::Json => println!("{}", format_json(outcome)?),
    }

    for failure in &outcome.failures {
        eprintln!("{}: {}", failure.file_name, failure.error);
    }
    if outcome.any_rate_limited() {
        eprintln!("{RATE_LIMIT_NOTICE}");
    }

    if outcome.table.is_empty() && !outcome.failures.is_empty() {
        return Err(CommandError::AllFilesFailed(outcome.failures.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ExtractArgs {
        ExtractArgs {
            schema: PathBuf::from("schema.json"),
            files: vec![PathBuf::from("a.pdf")],
            format_style: None,
            model: None,
            jobs: None,
            fail_fast: false,
            output: "table".into(),
        }
    }

    #[test]
    fn no_overrides_keep_config() {
        let config = args().apply_to(ExtractorConfig::default());
        assert_eq!(config, ExtractorConfig::default());
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut a = args();
        a.model = Some("gemini-1.5-flash".into());
        a.format_style = Some(FormatStyle::Google);
        a.jobs = Some(0);
        a.fail_fast = true;

        let config = a.apply_to(ExtractorConfig::default());
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.format_style, FormatStyle::Google);
        assert_eq!(config.max_workers, 1);
        assert!(config.fail_fast);
    }

    #[test]
    fn unknown_output_rejected_before_any_work() {
        let mut a = args();
        a.output = "xml".into();
        assert!(matches!(run(a), Err(CommandError::UnknownOutput(_))));
    }
}
