//! Field-level validation results shared by every write path.
//!
//! Services collect violations into [`ValidationErrors`] and return them in one go so clients
//! see every offending field, not only the first one.

use std::fmt;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MinLength(usize),
    Email,
    Url,
    Invalid,
    /// Value must be strictly after the named field.
    After(&'static str),
    NotNegative,
    /// Referenced row does not exist.
    Exists,
    Between(i64, i64),
    CityProvinceMismatch,
    DefaultRoleMissing,
    InvalidCredentials,
    MaxKilobytes(u64),
    /// Comma separated list of accepted extensions.
    FileType(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub rule: Rule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, rule: Rule) -> Self {
        let mut errors = Self::new();
        errors.push(field, rule);
        errors
    }

    pub fn push(&mut self, field: &'static str, rule: Rule) {
        self.violations.push(Violation { field, rule });
    }

    /// Trimmed character count check; an empty value is reported as missing.
    pub fn min_chars(&mut self, field: &'static str, value: &str, min: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, Rule::Required);
        } else if trimmed.chars().count() < min {
            self.push(field, Rule::MinLength(min));
        }
    }

    pub fn min_chars_opt(&mut self, field: &'static str, value: Option<&str>, min: usize) {
        if let Some(value) = value {
            self.min_chars(field, value, min);
        }
    }

    pub fn email(&mut self, field: &'static str, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, Rule::Required);
            return;
        }
        let valid = match trimmed.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !trimmed.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            self.push(field, Rule::Email);
        }
    }

    /// Accepts absolute `http` and `https` URLs only.
    pub fn http_url(&mut self, field: &'static str, value: &str) {
        match Url::parse(value.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => self.push(field, Rule::Url),
        }
    }

    pub fn year(&mut self, field: &'static str, value: i32) {
        let (min, max) = (1900, 2100);
        if !(min..=max).contains(&(value as i64)) {
            self.push(field, Rule::Between(min, max));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn has(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.violations.extend(other.violations);
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.violations.iter().map(|v| v.field).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_chars_distinguishes_missing_from_short() {
        let mut errors = ValidationErrors::new();
        errors.min_chars("title", "   ", 3);
        errors.min_chars("content", "short", 10);
        errors.min_chars("name", "Budi", 3);
        assert_eq!(
            errors.violations(),
            &[
                Violation {
                    field: "title",
                    rule: Rule::Required
                },
                Violation {
                    field: "content",
                    rule: Rule::MinLength(10)
                },
            ]
        );
    }

    #[test]
    fn email_and_url_checks() {
        let mut errors = ValidationErrors::new();
        errors.email("email", "alumni@kampus.ac.id");
        errors.http_url("registration_link", "https://karir.example.com/apply");
        assert!(errors.is_empty());

        errors.email("email", "not-an-email");
        errors.http_url("registration_link", "ftp://example.com");
        assert!(errors.has("email"));
        assert!(errors.has("registration_link"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn years_outside_range_are_rejected() {
        let mut errors = ValidationErrors::new();
        errors.year("enrollment_year", 2019);
        errors.year("graduation_year", 1800);
        assert_eq!(errors.violations().len(), 1);
        assert_eq!(errors.violations()[0].rule, Rule::Between(1900, 2100));
    }
}
