use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// The AI response could not be turned into an analysis record.
    InvalidRecord(String),
    /// Report generation failed after layout started.
    Pdf(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidRecord(msg) => write!(f, "invalid analysis record: {msg}"),
            Error::Pdf(msg) => write!(f, "report generation failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
