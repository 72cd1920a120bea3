use std::fmt;

use crate::{
    COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, DbError, EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ID_SIZE,
    ROW_SIZE, Result, USERNAME_OFFSET, USERNAME_SIZE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl Row {
    pub fn new(id: i32, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
        }
    }

    /// The B-tree key for this row. Only meaningful once `id` has been validated.
    pub fn key(&self) -> u32 {
        self.id as u32
    }

    /// Checks the row against the column limits without encoding it.
    pub fn validate(&self) -> Result<()> {
        if self.id <= 0 {
            return Err(DbError::InvalidId);
        }
        check_text("username", &self.username, COLUMN_USERNAME_SIZE)?;
        check_text("email", &self.email, COLUMN_EMAIL_SIZE)?;
        Ok(())
    }

    pub fn serialize(&self) -> Result<[u8; ROW_SIZE]> {
        self.validate()?;

        let mut bytes = [0u8; ROW_SIZE];
        bytes[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        write_padded(
            &mut bytes[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE],
            &self.username,
        );
        write_padded(&mut bytes[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE], &self.email);
        Ok(bytes)
    }

    /// Decodes a row written by [`Row::serialize`].
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`ROW_SIZE`]. Rows only come out of
    /// page buffers, so a short slice is a bug in the caller.
    pub fn deserialize(bytes: &[u8]) -> Self {
        assert!(
            bytes.len() >= ROW_SIZE,
            "row buffer is {} bytes, expected {ROW_SIZE}",
            bytes.len()
        );

        let id = i32::from_le_bytes(
            bytes[ID_OFFSET..ID_OFFSET + ID_SIZE]
                .try_into()
                .expect("id slot is ID_SIZE bytes"),
        );
        Self {
            id,
            username: read_padded(&bytes[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]),
            email: read_padded(&bytes[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

// NUL terminates a slot on disk, so it cannot appear inside a value.
fn check_text(column: &'static str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(DbError::ValueTooLong {
            column,
            len: value.len(),
            max,
        });
    }
    if value.contains('\0') {
        return Err(DbError::NulInValue { column });
    }
    Ok(())
}

// The slot is zeroed beforehand, so the tail is already NUL padding.
fn write_padded(slot: &mut [u8], value: &str) {
    slot[..value.len()].copy_from_slice(value.as_bytes());
}

fn read_padded(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}
