// PatientId - identifier parsed from upload filenames
//
// Recordings are named `<id>_<anything>.wav` where <id> is either all digits
// (`034_bar.wav`) or a two-letter site prefix followed by digits
// (`AB12_foo.wav`). The numeric part is the patient identifier.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::InputError;

/// Numeric patient identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PatientId(u64);

impl PatientId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Parse the identifier out of a recording filename
    ///
    /// Directory components are ignored. The token is the text before the first
    /// `_`, or the file stem when there is no `_`.
    pub fn from_filename(filename: &str) -> Result<Self, InputError> {
        let invalid = || InputError::InvalidIdentifier {
            filename: filename.to_string(),
        };

        let name = Path::new(filename)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(invalid)?;

        let token = match name.split_once('_') {
            Some((head, _)) => head,
            None => Path::new(name)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(invalid)?,
        };

        let digits = match token.chars().next() {
            Some(c) if c.is_ascii_alphabetic() => {
                let mut chars = token.chars();
                let prefix_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                    && chars.next().is_some_and(|c| c.is_ascii_alphabetic());
                if !prefix_ok {
                    return Err(invalid());
                }
                &token[2..]
            }
            Some(_) => token,
            None => return Err(invalid()),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        digits.parse::<u64>().map(Self).map_err(|_| invalid())
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_prefix() {
        assert_eq!(PatientId::from_filename("AB12_foo.wav").unwrap().value(), 12);
        assert_eq!(PatientId::from_filename("xy7_a_b.wav").unwrap().value(), 7);
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(PatientId::from_filename("034_bar.wav").unwrap().value(), 34);
        assert_eq!(PatientId::from_filename("101.wav").unwrap().value(), 101);
    }

    #[test]
    fn test_directories_ignored() {
        assert_eq!(
            PatientId::from_filename("uploads/2024/AB12_foo.wav").unwrap(),
            PatientId::new(12)
        );
    }

    #[test]
    fn test_malformed_names_rejected() {
        for name in [
            "",
            "_foo.wav",
            "AB_foo.wav",
            "A1_foo.wav",
            "ABC12_foo.wav",
            "12a_foo.wav",
            "foo.wav",
            "99999999999999999999999_x.wav",
        ] {
            assert_eq!(
                PatientId::from_filename(name),
                Err(InputError::InvalidIdentifier {
                    filename: name.to_string()
                }),
                "accepted {:?}",
                name
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(PatientId::new(34).to_string(), "34");
    }
}
