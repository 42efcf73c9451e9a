use std::fmt;

/// Errors a [`crate::DirectoryGateway`] may return.
///
/// Only [`DirectoryError::Rejected`] is scoped to a single operation; every
/// other variant means the connection itself is unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The server could not be reached or the session could not be set up.
    Connection(String),
    /// The bind was refused (invalid credentials, locked account, ...).
    Authentication(String),
    /// The transport failed after a successful bind.
    ConnectionLost(String),
    /// The server answered the operation with a non-success result code.
    Rejected { rc: u32, text: String },
}

impl DirectoryError {
    /// `true` when the error is confined to the one operation that produced
    /// it and the connection remains usable.
    pub fn is_operation_scoped(&self) -> bool {
        matches!(self, DirectoryError::Rejected { .. })
    }
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryError::Connection(msg) => write!(f, "directory connection failed: {msg}"),
            DirectoryError::Authentication(msg) => {
                write!(f, "directory authentication rejected: {msg}")
            }
            DirectoryError::ConnectionLost(msg) => write!(f, "directory connection lost: {msg}"),
            DirectoryError::Rejected { rc, text } if text.is_empty() => {
                write!(f, "directory rejected operation rc={rc}")
            }
            DirectoryError::Rejected { rc, text } => {
                write!(f, "directory rejected operation rc={rc}: {text}")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rejection_is_operation_scoped() {
        assert!(DirectoryError::Rejected {
            rc: 50,
            text: String::new()
        }
        .is_operation_scoped());
        assert!(!DirectoryError::ConnectionLost("eof".to_string()).is_operation_scoped());
        assert!(!DirectoryError::Authentication("rc=49".to_string()).is_operation_scoped());
    }

    #[test]
    fn display_rejected_with_text() {
        let e = DirectoryError::Rejected {
            rc: 19,
            text: "constraint violation".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "directory rejected operation rc=19: constraint violation"
        );
    }

    #[test]
    fn display_rejected_without_text() {
        let e = DirectoryError::Rejected {
            rc: 50,
            text: String::new(),
        };
        assert_eq!(e.to_string(), "directory rejected operation rc=50");
    }
}
