use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be parsed or failed validation. Nothing is rendered.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Logo or signature could not be fetched or decoded. Recovered inside rendering.
    #[error("Image error: {0}")]
    Image(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    /// The print command could not be dispatched.
    #[error("Print error: {0}")]
    Print(String),

    #[error("Settings error: {0}")]
    Settings(String),

    /// A download code was missing, unknown, used or expired.
    #[error("Download code rejected: {0}")]
    Code(String),
}
