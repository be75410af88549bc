//! Extraction run orchestrator.
//!
//! Single entry point driving one "Extract" action:
//! compile schema → extract every file → assemble rows.
//!
//! Uses trait-based DI for the provider (`DocumentExtractor`) so the
//! orchestrator stays testable with mock implementations.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{ExtractionResult, ResultTable, Schema, UploadedFile};
use crate::pipeline::assemble::assemble_rows;
use crate::pipeline::extraction::{Credentials, DocumentExtractor, ExtractionError};
use crate::pipeline::schema::{compile, CompiledRequest, FormatStyle, SchemaError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("No files to extract from")]
    NoFiles,

    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Extraction failed for {file_name}: {source}")]
    Extraction {
        file_name: String,
        #[source]
        source: ExtractionError,
    },
}

impl ProcessingError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::Extraction { source, .. } if source.is_rate_limit())
    }
}

// ---------------------------------------------------------------------------
// Options & result types
// ---------------------------------------------------------------------------

/// What a failed file does to the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Keep going; report failed files next to the table.
    #[default]
    Collect,
    /// Stop at the first failure and return it.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorOptions {
    pub format_style: FormatStyle,
    /// 1 processes files strictly one after another.
    pub max_workers: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            format_style: FormatStyle::Default,
            max_workers: 1,
            failure_policy: FailurePolicy::Collect,
        }
    }
}

/// A file whose extraction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file_name: String,
    pub error: ExtractionError,
}

/// Serializable view of a failure for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub file_name: String,
    pub kind: &'static str,
    pub message: String,
}

impl From<&FileFailure> for FailureSummary {
    fn from(failure: &FileFailure) -> Self {
        Self {
            file_name: failure.file_name.clone(),
            kind: failure.error.kind(),
            message: failure.error.to_string(),
        }
    }
}

/// Output of one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub run_id: Uuid,
    pub table: ResultTable,
    /// In upload order. Empty when every file succeeded.
    pub failures: Vec<FileFailure>,
    pub duration_ms: u64,
}

impl ExtractionOutcome {
    pub fn any_rate_limited(&self) -> bool {
        self.failures.iter().any(|f| f.error.is_rate_limit())
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs the pipeline over a set of files with one extractor and one credential.
pub struct Processor {
    extractor: Arc<dyn DocumentExtractor>,
    credentials: Credentials,
    options: ProcessorOptions,
}

type Slot = Option<Result<ExtractionResult, ExtractionError>>;

impl Processor {
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        credentials: Credentials,
        options: ProcessorOptions,
    ) -> Self {
        Self {
            extractor,
            credentials,
            options,
        }
    }

    /// Extract every file against the schema. Rows keep upload order.
    pub fn run(
        &self,
        files: &[UploadedFile],
        schema: &Schema,
    ) -> Result<ExtractionOutcome, ProcessingError> {
        if files.is_empty() {
            return Err(ProcessingError::NoFiles);
        }
        let compiled = compile(schema, self.options.format_style)?;

        let run_id = Uuid::new_v4();
        let _span = tracing::info_span!(
            "extract_run",
            %run_id,
            provider = self.extractor.provider(),
            files = files.len(),
            fields = schema.len(),
        )
        .entered();
        let start = Instant::now();

        let slots = self.extract_all(files, &compiled);

        let mut results = Vec::with_capacity(files.len());
        let mut failures = Vec::new();
        for (file, slot) in files.iter().zip(slots) {
            match slot {
                Some(Ok(result)) => results.push(result),
                Some(Err(error)) => {
                    if self.options.failure_policy == FailurePolicy::Abort {
                        return Err(ProcessingError::Extraction {
                            file_name: file.name.clone(),
                            source: error,
                        });
                    }
                    tracing::warn!(file = %file.name, error = %error, "File extraction failed");
                    failures.push(FileFailure {
                        file_name: file.name.clone(),
                        error,
                    });
                }
                // Not attempted: the run was aborted by an earlier failure.
                None => {}
            }
        }

        let table = assemble_rows(schema, &results, files.len() > 1);
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            rows = table.len(),
            failed = failures.len(),
            duration_ms,
            "Extraction run complete"
        );

        Ok(ExtractionOutcome {
            run_id,
            table,
            failures,
            duration_ms,
        })
    }

    fn extract_one(
        &self,
        file: &UploadedFile,
        compiled: &CompiledRequest,
    ) -> Result<ExtractionResult, ExtractionError> {
        self.extractor
            .extract(&file.name, &file.bytes, compiled, &self.credentials)
    }

    /// One slot per file, by upload index.
    fn extract_all(&self, files: &[UploadedFile], compiled: &CompiledRequest) -> Vec<Slot> {
        let workers = self.options.max_workers.clamp(1, files.len());
        let abort_on_error = self.options.failure_policy == FailurePolicy::Abort;

        if workers == 1 {
            let mut slots: Vec<Slot> = Vec::with_capacity(files.len());
            for file in files {
                let result = self.extract_one(file, compiled);
                let failed = result.is_err();
                slots.push(Some(result));
                if failed && abort_on_error {
                    break;
                }
            }
            slots.resize_with(files.len(), || None);
            return slots;
        }

        tracing::debug!(workers, "Extracting with worker pool");
        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let slots: Mutex<Vec<Slot>> = Mutex::new((0..files.len()).map(|_| None).collect());
        let parent = tracing::Span::current();

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    let _entered = parent.enter();
                    loop {
                        if stop.load(Ordering::SeqCst) {
                            break;
                        }
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(file) = files.get(index) else {
                            break;
                        };
                        let result = self.extract_one(file, compiled);
                        if result.is_err() && abort_on_error {
                            stop.store(true, Ordering::SeqCst);
                        }
                        match slots.lock() {
                            Ok(mut guard) => guard[index] = Some(result),
                            Err(poisoned) => poisoned.into_inner()[index] = Some(result),
                        }
                    }
                });
            }
        });

        slots.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
