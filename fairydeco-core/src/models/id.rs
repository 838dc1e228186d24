use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Story (book) identifier assigned by the story service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub i32);

impl BookId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<i32> for BookId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl FromStr for BookId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i32>()
            .map(Self)
            .map_err(|_| Error::InvalidInput(format!("Invalid book id: {s}")))
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&BookId::new(42)).unwrap();
        assert_eq!(json, "42");

        let id: BookId = serde_json::from_str("7").unwrap();
        assert_eq!(id, BookId(7));
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn test_book_id_parses_from_path_segment() {
        assert_eq!("42".parse::<BookId>().unwrap(), BookId(42));
        assert_eq!("-3".parse::<BookId>().unwrap(), BookId(-3));

        let err = "abc".parse::<BookId>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref msg) if msg == "Invalid book id: abc"));
        // Out of i32 range
        assert!("4294967296".parse::<BookId>().is_err());
    }
}
