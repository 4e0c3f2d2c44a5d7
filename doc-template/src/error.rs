use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("no template found for document type '{document_type}'")]
    InvalidDocumentType { document_type: String },
    #[error("field '{field}' is not defined for document type '{document_type}'")]
    UnknownField {
        document_type: String,
        field: String,
    },
    #[error("the global template registry is not initialized")]
    Uninitialized,
    #[error("the global template registry is already initialized")]
    AlreadyInitialized,
}
