//! Custom (non-catalog) book entry
//!
//! Raw form strings are trimmed, `subject` and `name` are required, an empty
//! level becomes [`CUSTOM_LEVEL`], and the duration is coerced forgivingly:
//! anything that is not a finite, non-negative number reads as zero hours.

use crate::error::{FormField, ValidationError};
use std::str::FromStr;

/// Level label given to custom books entered without one
pub const CUSTOM_LEVEL: &str = "custom";

/// Raw custom-book form input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomBookForm {
    pub subject: String,
    pub level: String,
    pub name: String,
    pub duration: String,
}

impl CustomBookForm {
    pub fn new(
        subject: impl Into<String>,
        level: impl Into<String>,
        name: impl Into<String>,
        duration: impl ToString,
    ) -> Self {
        Self {
            subject: subject.into(),
            level: level.into(),
            name: name.into(),
            duration: duration.to_string(),
        }
    }
}

/// `subject|level|name|hours`, trailing parts optional
impl FromStr for CustomBookForm {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, '|');
        let mut next = || parts.next().unwrap_or_default().to_string();
        Ok(Self {
            subject: next(),
            level: next(),
            name: next(),
            duration: next(),
        })
    }
}

/// Validated, normalized custom book
#[derive(Debug, Clone, PartialEq)]
pub struct CustomBookDraft {
    pub subject: String,
    pub level: String,
    pub name: String,
    pub duration_hours: f64,
}

/// Validate and normalize a custom-book form
pub fn build(form: &CustomBookForm) -> Result<CustomBookDraft, ValidationError> {
    let subject = form.subject.trim();
    if subject.is_empty() {
        return Err(ValidationError { field: FormField::Subject });
    }

    let name = form.name.trim();
    if name.is_empty() {
        return Err(ValidationError { field: FormField::Name });
    }

    let level = match form.level.trim() {
        "" => CUSTOM_LEVEL,
        level => level,
    };

    Ok(CustomBookDraft {
        subject: subject.to_string(),
        level: level.to_string(),
        name: name.to_string(),
        duration_hours: coerce_duration(&form.duration),
    })
}

/// Hours from free text; blank, non-numeric, negative or non-finite input is 0
pub fn coerce_duration(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(hours) if hours.is_finite() && hours >= 0.0 => hours,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_defaults_level() {
        let draft = build(&CustomBookForm::new("  Math ", "", " Notes  ", "3.5")).unwrap();
        assert_eq!(draft.subject, "Math");
        assert_eq!(draft.level, CUSTOM_LEVEL);
        assert_eq!(draft.name, "Notes");
        assert_eq!(draft.duration_hours, 3.5);
    }

    #[test]
    fn test_empty_subject_reported_first() {
        let err = build(&CustomBookForm::new("", "", "", 5)).unwrap_err();
        assert_eq!(err.field, FormField::Subject);

        let err = build(&CustomBookForm::new("   ", "Basic", "Foo", 5)).unwrap_err();
        assert_eq!(err.field, FormField::Subject);
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = build(&CustomBookForm::new("Math", "Basic", " \t", 5)).unwrap_err();
        assert_eq!(err.field, FormField::Name);
    }

    #[test]
    fn test_duration_coercion_is_forgiving() {
        assert_eq!(coerce_duration(""), 0.0);
        assert_eq!(coerce_duration("  12 "), 12.0);
        assert_eq!(coerce_duration("ten"), 0.0);
        assert_eq!(coerce_duration("-4"), 0.0);
        assert_eq!(coerce_duration("NaN"), 0.0);
        assert_eq!(coerce_duration("inf"), 0.0);
    }

    #[test]
    fn test_parse_pipe_form() {
        let form: CustomBookForm = "Math|Basic|Worksheet X|2".parse().unwrap();
        assert_eq!(form, CustomBookForm::new("Math", "Basic", "Worksheet X", "2"));

        let form: CustomBookForm = "Math||Notes".parse().unwrap();
        let draft = build(&form).unwrap();
        assert_eq!(draft.level, CUSTOM_LEVEL);
        assert_eq!(draft.duration_hours, 0.0);
    }
}
