mod book;
mod filter;

pub use self::{book::*, filter::*};

use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use error_stack::Report;
use serde::Serialize;

use crate::KernelError;

/// Field name to message. Attached to `KernelError::Validation` reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Accumulates failed checks, keeping the first message per field.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .0
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn into_result(self) -> error_stack::Result<(), KernelError> {
        if self.is_valid() {
            return Ok(());
        }
        Err(Report::new(KernelError::Validation).attach_printable(self.errors))
    }
}

pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|value| seen.insert(value))
}

#[cfg(test)]
mod test {
    use super::{unique, ValidationErrors, Validator};
    use crate::KernelError;

    #[test]
    fn first_message_wins() {
        let mut v = Validator::new();
        v.check(false, "title", "must be provided");
        v.check(false, "title", "must not be more than 500 bytes long");
        v.check(true, "year", "must be provided");
        assert!(!v.is_valid());
        assert_eq!(v.errors().iter().count(), 1);
        assert_eq!(v.errors().get("title"), Some("must be provided"));
        assert_eq!(v.errors().get("year"), None);
    }

    #[test]
    fn report_carries_errors() {
        let mut v = Validator::new();
        v.add_error("genres", "must not contain duplicate values");
        let report = v.into_result().unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Validation);
        let errors = report.downcast_ref::<ValidationErrors>().unwrap();
        assert_eq!(
            errors.get("genres"),
            Some("must not contain duplicate values")
        );
        assert_eq!(errors.to_string(), "genres: must not contain duplicate values");
    }

    #[test]
    fn valid_is_ok() {
        assert!(Validator::new().into_result().is_ok());
    }

    #[test]
    fn helpers() {
        assert!(unique(&["a", "b", "c"]));
        assert!(!unique(&["a", "b", "a"]));
        assert!(unique::<&str>(&[]));
    }
}
