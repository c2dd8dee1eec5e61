use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum WellPressError {
    Cancelled,
    PdfSerialization(String),
    RtfSerialization(String),
    PageRead(String),
    Packaging { path: PathBuf, message: String },
    VisitUnavailable(i64),
    InvalidConfiguration(String),
    Io(std::io::Error),
    Zip(zip::result::ZipError),
}

impl fmt::Display for WellPressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WellPressError::Cancelled => write!(f, "export cancelled; no file written"),
            WellPressError::PdfSerialization(message) => {
                write!(f, "pdf serialization failed: {}", message)
            }
            WellPressError::RtfSerialization(message) => {
                write!(f, "rtf serialization failed: {}", message)
            }
            WellPressError::PageRead(part) => {
                write!(f, "failed reading intermediate page: {}", part)
            }
            WellPressError::Packaging { path, message } => {
                write!(f, "packaging failed at {}: {}", path.display(), message)
            }
            WellPressError::VisitUnavailable(id) => {
                write!(f, "no report data available for visit {}", id)
            }
            WellPressError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            WellPressError::Io(err) => write!(f, "io error: {}", err),
            WellPressError::Zip(err) => write!(f, "archive error: {}", err),
        }
    }
}

impl std::error::Error for WellPressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WellPressError::Io(err) => Some(err),
            WellPressError::Zip(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WellPressError {
    fn from(value: std::io::Error) -> Self {
        WellPressError::Io(value)
    }
}

impl From<zip::result::ZipError> for WellPressError {
    fn from(value: zip::result::ZipError) -> Self {
        WellPressError::Zip(value)
    }
}
