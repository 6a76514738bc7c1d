use std::fmt::{Display, Formatter};
use std::str::FromStr;

use error_stack::{Report, ResultExt};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use vodca::{AsRefln, Fromln};

use crate::KernelError;

/// ISBN in its 32-bit storage form.
///
/// At the serialization boundary it is a JSON string. Encoding writes the decimal
/// digits without grouping, decoding accepts any placement of hyphens:
///
/// ```
/// # use kernel::prelude::entity::Isbn;
/// let isbn = Isbn::decode(r#""978-0-306-4""#).unwrap();
/// assert_eq!(isbn, Isbn::new(97803064));
/// assert_eq!(isbn.encode(), r#""97803064""#);
/// ```
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Fromln, AsRefln)]
pub struct Isbn(i32);

impl Isbn {
    pub fn new(isbn: impl Into<i32>) -> Self {
        Self(isbn.into())
    }

    pub fn encode(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Decodes a quoted JSON string such as `"978-0-306-4"`. The quotes must be the
    /// first and last characters.
    pub fn decode(raw: &str) -> error_stack::Result<Self, KernelError> {
        if raw.len() < 2 || !raw.starts_with('"') || !raw.ends_with('"') {
            return Err(Report::new(KernelError::InvalidFormat)
                .attach_printable(format!("ISBN is not a quoted string: {raw}")));
        }
        let text: String = serde_json::from_str(raw)
            .change_context(KernelError::InvalidFormat)
            .attach_printable_lazy(|| format!("ISBN is not a quoted string: {raw}"))?;
        text.parse()
    }
}

impl Display for Isbn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Isbn {
    type Err = Report<KernelError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s.replace('-', "");
        cleaned
            .parse::<i32>()
            .map(Self)
            .change_context(KernelError::InvalidFormat)
            .attach_printable_lazy(|| format!("ISBN digits do not fit a 32-bit integer: {s}"))
    }
}

impl Serialize for Isbn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Isbn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse()
            .map_err(|_| D::Error::custom(format!("invalid ISBN format: {text}")))
    }
}
