use std::borrow::Cow;
use std::fmt;

use bytes::{Buf, BufMut};

use crate::common::{LeafDbError, Result, COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE};

pub const ID_SIZE: usize = std::mem::size_of::<u32>();
pub const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE;
pub const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Serialized size of a row in bytes.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A fixed-width table record.
///
/// ## Row Binary Format
///
/// ```text
/// +----------+--------------------+---------------------+
/// | id (u32) | username (32 B)    | email (255 B)       |
/// | LE       | NUL padded         | NUL padded          |
/// +----------+--------------------+---------------------+
/// ```
///
/// The text columns are stored byte for byte; a value that fills its
/// column completely has no terminator.
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    id: u32,
    username: [u8; USERNAME_SIZE],
    email: [u8; EMAIL_SIZE],
}

impl Row {
    /// Creates a row, rejecting text that does not fit its column.
    pub fn new(id: u32, username: &str, email: &str) -> Result<Self> {
        Ok(Self {
            id,
            username: pad_column("username", username.as_bytes())?,
            email: pad_column("email", email.as_bytes())?,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the username up to its first NUL byte.
    pub fn username(&self) -> Cow<'_, str> {
        column_text(&self.username)
    }

    /// Returns the email up to its first NUL byte.
    pub fn email(&self) -> Cow<'_, str> {
        column_text(&self.email)
    }

    /// Writes the row into the first `ROW_SIZE` bytes of `dst`.
    pub fn serialize(&self, dst: &mut [u8]) -> Result<()> {
        check_row_len(dst.len())?;
        let mut buf = &mut dst[..ROW_SIZE];
        buf.put_u32_le(self.id);
        buf.put_slice(&self.username);
        buf.put_slice(&self.email);
        Ok(())
    }

    /// Reads a row from the first `ROW_SIZE` bytes of `src`.
    pub fn deserialize(src: &[u8]) -> Result<Self> {
        check_row_len(src.len())?;
        let mut buf = &src[..ROW_SIZE];
        let id = buf.get_u32_le();
        let mut username = [0u8; USERNAME_SIZE];
        buf.copy_to_slice(&mut username);
        let mut email = [0u8; EMAIL_SIZE];
        buf.copy_to_slice(&mut email);

        Ok(Self {
            id,
            username,
            email,
        })
    }
}

fn check_row_len(len: usize) -> Result<()> {
    if len < ROW_SIZE {
        return Err(LeafDbError::CorruptNode(format!(
            "row buffer holds {} bytes, need {}",
            len, ROW_SIZE
        )));
    }
    Ok(())
}

fn pad_column<const N: usize>(field: &'static str, value: &[u8]) -> Result<[u8; N]> {
    if value.len() > N {
        return Err(LeafDbError::FieldTooLong {
            field,
            len: value.len(),
            max: N,
        });
    }

    let mut column = [0u8; N];
    column[..value.len()].copy_from_slice(value);
    Ok(column)
}

fn column_text(column: &[u8]) -> Cow<'_, str> {
    let end = column.iter().position(|&b| b == 0).unwrap_or(column.len());
    String::from_utf8_lossy(&column[..end])
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("id", &self.id)
            .field("username", &self.username())
            .field("email", &self.email())
            .finish()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username(), self.email())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_row_size() {
        assert_eq!(ROW_SIZE, 291);
        assert_eq!(EMAIL_OFFSET, 36);
    }

    #[test]
    fn test_row_layout() {
        let row = Row::new(0x0102_0304, "alice", "alice@example.com").unwrap();
        let mut buf = [0xFFu8; ROW_SIZE];
        row.serialize(&mut buf).unwrap();

        assert_eq!(&buf[ID_OFFSET..ID_OFFSET + 4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&buf[USERNAME_OFFSET..USERNAME_OFFSET + 5], b"alice");
        assert!(buf[USERNAME_OFFSET + 5..EMAIL_OFFSET].iter().all(|&b| b == 0));
        assert_eq!(&buf[EMAIL_OFFSET..EMAIL_OFFSET + 17], b"alice@example.com");
    }

    #[test]
    fn test_row_full_width_columns() {
        let username = "u".repeat(USERNAME_SIZE);
        let email = "e".repeat(EMAIL_SIZE);
        let row = Row::new(1, &username, &email).unwrap();

        let mut buf = [0u8; ROW_SIZE];
        row.serialize(&mut buf).unwrap();
        let decoded = Row::deserialize(&buf).unwrap();

        assert_eq!(decoded.username(), username.as_str());
        assert_eq!(decoded.email(), email.as_str());
    }

    #[test]
    fn test_row_rejects_long_fields() {
        let err = Row::new(1, &"u".repeat(USERNAME_SIZE + 1), "x").unwrap_err();
        assert!(matches!(
            err,
            LeafDbError::FieldTooLong {
                field: "username",
                len: 33,
                max: 32
            }
        ));

        let err = Row::new(1, "x", &"e".repeat(EMAIL_SIZE + 1)).unwrap_err();
        assert!(matches!(err, LeafDbError::FieldTooLong { field: "email", .. }));
    }

    #[test]
    fn test_row_short_buffer() {
        let row = Row::new(1, "a", "b").unwrap();
        let mut buf = [0u8; ROW_SIZE - 1];

        assert!(matches!(row.serialize(&mut buf), Err(LeafDbError::CorruptNode(_))));
        assert!(matches!(Row::deserialize(&buf), Err(LeafDbError::CorruptNode(_))));
    }

    #[test]
    fn test_row_display() {
        let row = Row::new(7, "bob", "bob@example.com").unwrap();
        assert_eq!(row.to_string(), "(7, bob, bob@example.com)");
    }

    proptest! {
        #[test]
        fn prop_row_round_trip(
            id in any::<u32>(),
            username in "[a-zA-Z0-9_]{0,32}",
            email in "[a-z0-9.@]{0,255}",
        ) {
            let row = Row::new(id, &username, &email).unwrap();
            let mut buf = vec![0u8; ROW_SIZE];
            row.serialize(&mut buf).unwrap();
            let decoded = Row::deserialize(&buf).unwrap();

            prop_assert_eq!(&decoded, &row);
            prop_assert_eq!(decoded.username(), username.as_str());
            prop_assert_eq!(decoded.email(), email.as_str());
        }
    }
}
