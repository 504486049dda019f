mod error;

pub use error::{RecordError, RecordResult};

use std::borrow::Cow;
use std::fmt;

/// Size of the row id field in bytes
pub const ID_SIZE: usize = std::mem::size_of::<u32>();
/// Size of the username field in bytes
pub const USERNAME_SIZE: usize = 32;
/// Size of the email field in bytes
pub const EMAIL_SIZE: usize = 255;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Serialized size of one row
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A single row of the hardcoded table schema.
///
/// The string fields are stored as fixed-width byte arrays, NUL-padded on
/// the right, exactly as they appear inside a leaf cell on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    username: [u8; USERNAME_SIZE],
    email: [u8; EMAIL_SIZE],
}

impl Row {
    /// Build a row, rejecting field values that do not fit their column.
    pub fn new(id: u32, username: &str, email: &str) -> RecordResult<Self> {
        if username.len() > USERNAME_SIZE {
            return Err(RecordError::FieldTooLong {
                field: "username",
                actual: username.len(),
                max: USERNAME_SIZE,
            });
        }
        if email.len() > EMAIL_SIZE {
            return Err(RecordError::FieldTooLong {
                field: "email",
                actual: email.len(),
                max: EMAIL_SIZE,
            });
        }

        let mut row = Self {
            id,
            username: [0; USERNAME_SIZE],
            email: [0; EMAIL_SIZE],
        };
        row.username[..username.len()].copy_from_slice(username.as_bytes());
        row.email[..email.len()].copy_from_slice(email.as_bytes());
        Ok(row)
    }

    /// Username with trailing NUL padding trimmed.
    pub fn username(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(trim_trailing_nuls(&self.username))
    }

    /// Email with trailing NUL padding trimmed.
    pub fn email(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(trim_trailing_nuls(&self.email))
    }

    /// Write the packed representation into `dst[0..ROW_SIZE]`.
    pub fn serialize(&self, dst: &mut [u8]) {
        dst[ID_OFFSET..USERNAME_OFFSET].copy_from_slice(&self.id.to_le_bytes());
        dst[USERNAME_OFFSET..EMAIL_OFFSET].copy_from_slice(&self.username);
        dst[EMAIL_OFFSET..ROW_SIZE].copy_from_slice(&self.email);
    }

    /// Read a row back out of `src[0..ROW_SIZE]`.
    pub fn deserialize(src: &[u8]) -> Self {
        let id = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);

        let mut username = [0u8; USERNAME_SIZE];
        username.copy_from_slice(&src[USERNAME_OFFSET..EMAIL_OFFSET]);

        let mut email = [0u8; EMAIL_SIZE];
        email.copy_from_slice(&src[EMAIL_OFFSET..ROW_SIZE]);

        Self {
            id,
            username,
            email,
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username(), self.email())
    }
}

fn trim_trailing_nuls(bytes: &[u8]) -> &[u8] {
    match bytes.iter().rposition(|&b| b != 0) {
        Some(last) => &bytes[..=last],
        None => &[],
    }
}
