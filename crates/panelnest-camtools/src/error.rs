//! Error types for the CAM tools crate.
//!
//! Decoding a machining program or a drawing either yields a complete result
//! or one of these errors; there is no partial result. Per-field leniency
//! inside a program (unparseable numbers, unknown geometry references) is
//! absorbed by the parser and never surfaces here.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading, writing or bundling files.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Building a zip bundle failed.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A file format error occurred.
    #[error("File format error: {0}")]
    FileFormat(#[from] FileFormatError),
}

/// Errors related to file format parsing and conversion.
#[derive(Error, Debug)]
pub enum FileFormatError {
    /// The DXF file could not be parsed or written.
    #[error("DXF parse error: {0}")]
    DxfParseError(String),

    /// The CIX program is structurally broken.
    #[error("CIX parse error: {0}")]
    CixParseError(String),

    /// A snapshot begin marker without its end marker, or an undecodable body.
    #[error("Missing or broken marker: {0}")]
    MissingMarker(String),

    /// The program declares no panel width or length.
    #[error("Missing dimension: {0}")]
    MissingDimension(String),

    /// The drawing has no rectangle to rebuild panels from.
    #[error("No usable geometry: {0}")]
    NoGeometry(String),

    /// The file is empty or contains no usable data.
    #[error("Empty file: {0}")]
    EmptyFile(String),

    /// The file extension is not recognized.
    #[error("Unknown file extension: {0}")]
    UnknownExtension(String),
}

impl From<dxf::DxfError> for FileFormatError {
    fn from(err: dxf::DxfError) -> Self {
        FileFormatError::DxfParseError(err.to_string())
    }
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for file format operations.
pub type FileFormatResult<T> = Result<T, FileFormatError>;
