use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("id must be positive")]
    InvalidId,

    #[error("{column} is {len} bytes, limit is {max}")]
    ValueTooLong {
        column: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{column} contains a NUL byte")]
    NulInValue { column: &'static str },

    #[error("key {0} already exists")]
    DuplicateKey(u32),

    #[error("table is full")]
    TableFull,

    #[error("database file of {len} bytes is corrupt: {reason}")]
    CorruptFile { len: u64, reason: &'static str },

    #[error("page {page} is corrupt: {reason}")]
    CorruptPage { page: u32, reason: &'static str },

    #[error("page {page} is out of bounds (limit {max})")]
    PageOutOfBounds { page: u32, max: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The REPL's input or output stream failed. The database file is fine.
    #[error("terminal I/O error: {0}")]
    Terminal(#[source] std::io::Error),
}

impl DbError {
    /// Fatal errors mean the on-disk state can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DbError::CorruptFile { .. }
                | DbError::CorruptPage { .. }
                | DbError::PageOutOfBounds { .. }
                | DbError::Io(_)
                | DbError::Terminal(_)
        )
    }

    /// Whether the error came from the database file or page state, as opposed
    /// to the session's own streams.
    pub fn is_storage_fault(&self) -> bool {
        self.is_fatal() && !matches!(self, DbError::Terminal(_))
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_fatal_errors() {
        assert!(!DbError::InvalidId.is_fatal());
        assert!(!DbError::DuplicateKey(1).is_fatal());
        assert!(!DbError::TableFull.is_fatal());
        let corrupt = DbError::CorruptFile {
            len: 10,
            reason: "partial page",
        };
        assert!(corrupt.is_fatal());
        assert!(DbError::Io(std::io::Error::other("disk gone")).is_fatal());
        assert!(!DbError::NulInValue { column: "email" }.is_fatal());
    }

    #[test]
    fn terminal_errors_are_not_storage_faults() {
        let terminal = DbError::Terminal(std::io::Error::other("broken pipe"));
        assert!(terminal.is_fatal());
        assert!(!terminal.is_storage_fault());
        assert!(DbError::Io(std::io::Error::other("disk gone")).is_storage_fault());
    }
}
