use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{self, extract::ExtractArgs, CommandError};
use crate::pipeline::schema::FormatStyle;

#[derive(Parser)]
#[command(
    name = "pdf-rows",
    version,
    about = "Extract user-defined fields from PDF files into a table using Gemini"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract schema fields from one or more PDF files
    Extract {
        /// JSON schema file: [{"Field": "...", "Type": "...", "Description": "..."}]
        #[arg(short, long, value_name = "FILE")]
        schema: PathBuf,

        /// PDF files, one table row each
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Prompt field-list style: default or google
        #[arg(long, value_name = "STYLE")]
        format_style: Option<FormatStyle>,

        /// Gemini model name
        #[arg(short, long)]
        model: Option<String>,

        /// Files extracted concurrently
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Stop the batch at the first failed file
        #[arg(long)]
        fail_fast: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// List the field types a schema may use
    Types,
}

impl Cli {
    pub fn dispatch(self) -> Result<(), CommandError> {
        match self.command {
            Commands::Extract {
                schema,
                files,
                format_style,
                model,
                jobs,
                fail_fast,
                output,
            } => commands::extract::run(ExtractArgs {
                schema,
                files,
                format_style,
                model,
                jobs,
                fail_fast,
                output,
            }),
            Commands::Types => commands::types::run(),
        }
    }
}
