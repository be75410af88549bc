//! Session state for one interactive extraction session.
//!
//! Holds the uploaded files, the schema being edited and the last run's
//! results. Stages advance Upload → Schema → Extracted; editing files or the
//! schema discards results, which only live until the next change.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{FieldSpec, Schema, UploadedFile};
use crate::pipeline::processor::{ExtractionOutcome, ProcessingError, Processor};
use crate::pipeline::schema::{editor_label_to_type, SchemaError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Upload at least one PDF file before extracting")]
    NoFiles,

    #[error("{0} is not a PDF file")]
    NotPdf(String),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

impl SessionError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::Processing(e) if e.is_rate_limit())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    /// No files yet.
    Upload,
    /// Files present; schema editable.
    Schema,
    /// Results of the last run are available.
    Extracted,
}

#[derive(Debug, Default)]
pub struct SessionState {
    files: Vec<UploadedFile>,
    /// Source path of each file uploaded from disk, keyed by display name.
    sources: HashMap<String, PathBuf>,
    schema: Schema,
    outcome: Option<ExtractionOutcome>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> SessionStage {
        if self.outcome.is_some() {
            SessionStage::Extracted
        } else if self.files.is_empty() {
            SessionStage::Upload
        } else {
            SessionStage::Schema
        }
    }

    /// Add a file. Re-uploading a name replaces the earlier file in place.
    pub fn upload(&mut self, file: UploadedFile) -> Result<(), SessionError> {
        if !file.is_pdf() {
            return Err(SessionError::NotPdf(file.name));
        }
        tracing::debug!(file = %file.name, size = file.size(), "File uploaded");

        match self.files.iter_mut().find(|f| f.name == file.name) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
        self.outcome = None;
        Ok(())
    }

    /// Add a file from disk. Uploading the same path again replaces it; a
    /// different path with the same file name gets its parent directory
    /// prefixed (`feb/invoice.pdf`), or the full path if that collides too.
    pub fn upload_path(&mut self, path: &Path) -> Result<(), SessionError> {
        let mut file = UploadedFile::from_path(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let base_name = file.name.clone();

        let candidates = [Some(file.name.clone()), parent_qualified_name(path)]
            .into_iter()
            .flatten()
            .chain(std::iter::once(path.display().to_string()));
        for candidate in candidates {
            if self.name_free_for(&candidate, &source) {
                file.name = candidate;
                break;
            }
        }
        if file.name != base_name {
            tracing::debug!(
                file = %file.name,
                base_name = %base_name,
                "Upload renamed to avoid a name clash"
            );
        }

        let name = file.name.clone();
        self.upload(file)?;
        self.sources.insert(name, source);
        Ok(())
    }

    /// A name is free when unused, or used by a file from the same source.
    fn name_free_for(&self, name: &str, source: &Path) -> bool {
        match self.sources.get(name) {
            Some(existing) => existing == source,
            None => !self.files.iter().any(|f| f.name == name),
        }
    }

    pub fn remove_file(&mut self, name: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.name != name);
        self.sources.remove(name);
        let removed = self.files.len() != before;
        if removed {
            self.outcome = None;
        }
        removed
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn set_schema(&mut self, schema: Schema) {
        self.schema = schema;
        self.outcome = None;
    }

    /// Append a field using an editor label (`text`, `number`, `whole number`,
    /// `TRUE/FALSE`). Labels the editor does not offer are rejected.
    pub fn add_editor_field(
        &mut self,
        name: &str,
        editor_label: &str,
        description: Option<&str>,
    ) -> Result<(), SessionError> {
        let value_type = editor_label_to_type(editor_label)
            .ok_or_else(|| SchemaError::UnsupportedEditorType(editor_label.to_string()))?;

        let mut field = FieldSpec::new(name, value_type.as_str());
        field.description = description.map(str::to_string);
        self.schema.push(field);
        self.outcome = None;
        Ok(())
    }

    /// Run extraction over all uploaded files. Previous results are dropped
    /// first, so a failed run leaves no stale table behind.
    pub fn extract(&mut self, processor: &Processor) -> Result<&ExtractionOutcome, SessionError> {
        self.outcome = None;
        if self.files.is_empty() {
            return Err(SessionError::NoFiles);
        }
        let outcome = processor.run(&self.files, &self.schema)?;
        Ok(self.outcome.insert(outcome))
    }

    pub fn outcome(&self) -> Option<&ExtractionOutcome> {
        self.outcome.as_ref()
    }
}

fn parent_qualified_name(path: &Path) -> Option<String> {
    let parent = path.parent()?.file_name()?.to_str()?;
    let name = path.file_name()?.to_str()?;
    Some(format!("{parent}/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::Value;
    use crate::pipeline::extraction::{
        Credentials, ExtractionError, GeminiExtractor, MockGenerateClient,
    };
    use crate::pipeline::processor::ProcessorOptions;

    fn pdf(name: &str) -> UploadedFile {
        UploadedFile::new(name, b"%PDF-1.4 test".to_vec())
    }

    fn processor(reply: &str) -> Processor {
        let client = Arc::new(MockGenerateClient::new(reply));
        let extractor = Arc::new(GeminiExtractor::new(client, "gemini-2.0-flash"));
        Processor::new(extractor, Credentials::new("key"), ProcessorOptions::default())
    }

    #[test]
    fn stages_advance() {
        let mut session = SessionState::new();
        assert_eq!(session.stage(), SessionStage::Upload);

        session.upload(pdf("a.pdf")).unwrap();
        assert_eq!(session.stage(), SessionStage::Schema);

        session.add_editor_field("amount", "number", None).unwrap();
        session.extract(&processor(r#"{"amount": 1.5}"#)).unwrap();
        assert_eq!(session.stage(), SessionStage::Extracted);

        session.add_editor_field("paid", "TRUE/FALSE", None).unwrap();
        assert_eq!(session.stage(), SessionStage::Schema);
        assert!(session.outcome().is_none());
    }

    #[test]
    fn non_pdf_upload_rejected() {
        let mut session = SessionState::new();
        let err = session
            .upload(UploadedFile::new("notes.txt", b"plain".to_vec()))
            .unwrap_err();
        assert!(matches!(err, SessionError::NotPdf(name) if name == "notes.txt"));
        assert!(session.files().is_empty());
    }

    #[test]
    fn reupload_replaces_in_place() {
        let mut session = SessionState::new();
        session.upload(pdf("a.pdf")).unwrap();
        session.upload(pdf("b.pdf")).unwrap();
        session
            .upload(UploadedFile::new("a.pdf", b"%PDF-2.0".to_vec()))
            .unwrap();

        let names: Vec<&str> = session.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.pdf", "b.pdf"]);
        assert_eq!(session.files()[0].bytes, b"%PDF-2.0");
    }

    #[test]
    fn same_name_from_different_folders_kept_apart() {
        let dir = tempfile::tempdir().unwrap();
        let jan = dir.path().join("jan");
        let feb = dir.path().join("feb");
        std::fs::create_dir_all(&jan).unwrap();
        std::fs::create_dir_all(&feb).unwrap();
        std::fs::write(jan.join("invoice.pdf"), b"%PDF-1.4 january").unwrap();
        std::fs::write(feb.join("invoice.pdf"), b"%PDF-1.4 february").unwrap();

        let mut session = SessionState::new();
        session.upload_path(&jan.join("invoice.pdf")).unwrap();
        session.upload_path(&feb.join("invoice.pdf")).unwrap();

        let names: Vec<&str> = session.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["invoice.pdf", "feb/invoice.pdf"]);

        session.add_editor_field("amount", "number", None).unwrap();
        let outcome = session.extract(&processor(r#"{"amount": 3.0}"#)).unwrap();
        assert_eq!(outcome.table.len(), 2);
        assert!(outcome.table.has_file_name_column());
        assert_eq!(
            outcome.table.cell(1, crate::models::FILE_NAME_COLUMN),
            Some(&Value::Str("feb/invoice.pdf".into()))
        );
    }

    #[test]
    fn same_path_uploaded_twice_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        std::fs::write(&path, b"%PDF-1.4 first").unwrap();

        let mut session = SessionState::new();
        session.upload_path(&path).unwrap();
        std::fs::write(&path, b"%PDF-1.4 second").unwrap();
        session.upload_path(&path).unwrap();

        assert_eq!(session.files().len(), 1);
        assert_eq!(session.files()[0].name, "invoice.pdf");
        assert_eq!(session.files()[0].bytes, b"%PDF-1.4 second");
    }

    #[test]
    fn remove_file_reports_presence() {
        let mut session = SessionState::new();
        session.upload(pdf("a.pdf")).unwrap();
        assert!(session.remove_file("a.pdf"));
        assert!(!session.remove_file("a.pdf"));
        assert_eq!(session.stage(), SessionStage::Upload);
    }

    #[test]
    fn editor_rejects_temporal_types() {
        let mut session = SessionState::new();
        let err = session.add_editor_field("due", "date", None).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Schema(SchemaError::UnsupportedEditorType(_))
        ));
        assert!(session.schema().is_empty());
    }

    #[test]
    fn editor_fields_store_canonical_types() {
        let mut session = SessionState::new();
        session
            .add_editor_field("lines", "whole number", Some("Number of line items"))
            .unwrap();
        let field = &session.schema().fields()[0];
        assert_eq!(field.type_label, "int");
        assert_eq!(field.hint(), Some("Number of line items"));
    }

    #[test]
    fn extract_without_files_fails() {
        let mut session = SessionState::new();
        session.add_editor_field("amount", "number", None).unwrap();
        let err = session.extract(&processor("{}")).unwrap_err();
        assert!(matches!(err, SessionError::NoFiles));
    }

    #[test]
    fn extract_with_empty_schema_fails() {
        let mut session = SessionState::new();
        session.upload(pdf("a.pdf")).unwrap();
        let err = session.extract(&processor("{}")).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Processing(ProcessingError::Schema(SchemaError::Empty))
        ));
    }

    #[test]
    fn extract_stores_outcome() {
        let mut session = SessionState::new();
        session.upload(pdf("a.pdf")).unwrap();
        session.add_editor_field("amount", "number", None).unwrap();

        let outcome = session.extract(&processor(r#"{"amount": 42.5}"#)).unwrap();
        assert_eq!(outcome.table.cell(0, "amount"), Some(&Value::Float(42.5)));
        assert!(session.outcome().is_some());
    }

    #[test]
    fn rate_limit_is_detectable_through_session_error() {
        let client = Arc::new(MockGenerateClient::failing(ExtractionError::RateLimit(
            "quota".into(),
        )));
        let extractor = Arc::new(GeminiExtractor::new(client, "gemini-2.0-flash"));
        let options = ProcessorOptions {
            failure_policy: crate::pipeline::processor::FailurePolicy::Abort,
            ..ProcessorOptions::default()
        };
        let processor = Processor::new(extractor, Credentials::new("key"), options);

        let mut session = SessionState::new();
        session.upload(pdf("a.pdf")).unwrap();
        session.add_editor_field("amount", "number", None).unwrap();
        let err = session.extract(&processor).unwrap_err();
        assert!(err.is_rate_limit());
        assert!(session.outcome().is_none());
    }
}
