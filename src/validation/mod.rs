//! Field-level validation
//!
//! Every declared field runs through its rules before any request is built.
//! Rules follow a chain of responsibility: each rule inspects one present
//! value and reports its own message.

use crate::core::{FieldError, FieldMap, ValidationErrors, is_blank};
use crate::resource::{FieldKind, FieldSpec};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::fmt;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid");
}

/// Rule applied to a non-blank field value
pub trait FieldRule: Send + Sync + fmt::Debug {
    fn check(&self, value: &Value) -> Result<(), String>;
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Minimum string length (characters) or list size
#[derive(Debug, Clone)]
pub struct MinLength {
    pub min: usize,
    pub message: String,
}

impl MinLength {
    pub fn new(min: usize, message: impl Into<String>) -> Self {
        Self {
            min,
            message: message.into(),
        }
    }
}

impl FieldRule for MinLength {
    fn check(&self, value: &Value) -> Result<(), String> {
        match length_of(value) {
            Some(len) if len < self.min => Err(self.message.clone()),
            _ => Ok(()),
        }
    }
}

/// Maximum string length (characters) or list size
#[derive(Debug, Clone)]
pub struct MaxLength {
    pub max: usize,
    pub message: String,
}

impl MaxLength {
    pub fn new(max: usize, message: impl Into<String>) -> Self {
        Self {
            max,
            message: message.into(),
        }
    }
}

impl FieldRule for MaxLength {
    fn check(&self, value: &Value) -> Result<(), String> {
        match length_of(value) {
            Some(len) if len > self.max => Err(self.message.clone()),
            _ => Ok(()),
        }
    }
}

/// Regular-expression match on the textual value
#[derive(Debug, Clone)]
pub struct Pattern {
    pub regex: Regex,
    pub message: String,
}

impl Pattern {
    pub fn new(regex: Regex, message: impl Into<String>) -> Self {
        Self {
            regex,
            message: message.into(),
        }
    }
}

impl FieldRule for Pattern {
    fn check(&self, value: &Value) -> Result<(), String> {
        match text_of(value) {
            Some(text) if self.regex.is_match(&text) => Ok(()),
            _ => Err(self.message.clone()),
        }
    }
}

/// Structural e-mail check (`local@domain.tld`, no whitespace)
#[derive(Debug, Clone)]
pub struct Email {
    pub message: String,
}

impl Email {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl FieldRule for Email {
    fn check(&self, value: &Value) -> Result<(), String> {
        match value.as_str() {
            Some(text) if EMAIL_REGEX.is_match(text.trim()) => Ok(()),
            _ => Err(self.message.clone()),
        }
    }
}

/// Inclusive numeric bounds
#[derive(Debug, Clone)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub message: String,
}

impl NumericRange {
    pub fn at_least(min: f64, message: impl Into<String>) -> Self {
        Self {
            min: Some(min),
            max: None,
            message: message.into(),
        }
    }

    pub fn between(min: f64, max: f64, message: impl Into<String>) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            message: message.into(),
        }
    }
}

impl FieldRule for NumericRange {
    fn check(&self, value: &Value) -> Result<(), String> {
        let Some(number) = number_of(value) else {
            return Err(self.message.clone());
        };

        let below = self.min.is_some_and(|min| number < min);
        let above = self.max.is_some_and(|max| number > max);
        if below || above {
            Err(self.message.clone())
        } else {
            Ok(())
        }
    }
}

/// Validate a draft against the declared fields
///
/// Create-only fields are skipped when `editing`. Blank optional fields skip
/// their rules; blank required fields report only the required message.
pub fn validate_draft(
    fields: &[FieldSpec],
    draft: &FieldMap,
    editing: bool,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for field in fields {
        if editing && field.create_only {
            continue;
        }

        let value = draft.get(&field.name);
        if is_blank(value) {
            if let Some(message) = &field.required {
                errors.push(FieldError::field(&field.name, message));
            }
            continue;
        }
        let Some(value) = value else { continue };

        if field.kind == FieldKind::Number && number_of(value).is_none() {
            errors.push(FieldError::field(
                &field.name,
                format!("{} must be a number", field.label),
            ));
            continue;
        }

        if field.kind == FieldKind::Bool && !value.is_boolean() {
            errors.push(FieldError::field(
                &field.name,
                format!("{} must be yes or no", field.label),
            ));
            continue;
        }

        for rule in &field.rules {
            if let Err(message) = rule.check(value) {
                errors.push(FieldError::field(&field.name, message));
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(value: Value) -> FieldMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_length_rules() {
        let min = MinLength::new(2, "too short");
        assert!(min.check(&json!("Salt")).is_ok());
        assert!(min.check(&json!("Sa")).is_ok());
        assert_eq!(min.check(&json!("S")), Err("too short".to_string()));

        let max = MaxLength::new(3, "too long");
        assert!(max.check(&json!("abc")).is_ok());
        assert!(max.check(&json!("abcd")).is_err());
        // characters, not bytes
        assert!(max.check(&json!("phở")).is_ok());
    }

    #[test]
    fn test_pattern_rule() {
        let rule = Pattern::new(Regex::new(r"^[a-zA-Z0-9_]+$").unwrap(), "bad username");
        assert!(rule.check(&json!("chef_01")).is_ok());
        assert!(rule.check(&json!("chef 01")).is_err());
        assert!(rule.check(&json!(true)).is_err());
    }

    #[test]
    fn test_email_rule() {
        let rule = Email::new("invalid email");
        assert!(rule.check(&json!("a@b.co")).is_ok());
        assert!(rule.check(&json!("a@b")).is_err());
        assert!(rule.check(&json!("a b@c.de")).is_err());
        assert!(rule.check(&json!("plainaddress")).is_err());
    }

    #[test]
    fn test_numeric_range() {
        let rule = NumericRange::at_least(0.0, "must be positive");
        assert!(rule.check(&json!(0)).is_ok());
        assert!(rule.check(&json!("12.5")).is_ok());
        assert!(rule.check(&json!(-1)).is_err());
        assert!(rule.check(&json!("abc")).is_err());

        let bounded = NumericRange::between(1.0, 5.0, "out of range");
        assert!(bounded.check(&json!(6)).is_err());
    }

    #[test]
    fn test_validate_draft_required_and_optional() {
        let fields = vec![
            FieldSpec::text("name", "Name")
                .required("Name is required")
                .rule(MinLength::new(2, "Name must be at least 2 characters long")),
            FieldSpec::text("phone", "Phone").rule(MinLength::new(9, "bad phone")),
        ];

        let errors = validate_draft(&fields, &draft(json!({"name": "  "})), false).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first_message(), Some("Name is required"));

        let errors = validate_draft(&fields, &draft(json!({"name": "S"})), false).unwrap_err();
        assert_eq!(
            errors.for_field("name").collect::<Vec<_>>(),
            vec!["Name must be at least 2 characters long"]
        );

        assert!(validate_draft(&fields, &draft(json!({"name": "Salt", "phone": ""})), false).is_ok());
    }

    #[test]
    fn test_validate_draft_skips_create_only_when_editing() {
        let fields = vec![FieldSpec::password("password", "Password")
            .required("Password is required")
            .create_only()];

        assert!(validate_draft(&fields, &FieldMap::new(), false).is_err());
        assert!(validate_draft(&fields, &FieldMap::new(), true).is_ok());
    }

    #[test]
    fn test_validate_draft_number_kind() {
        let fields = vec![FieldSpec::number("xu", "Xu")];
        let errors = validate_draft(&fields, &draft(json!({"xu": "lots"})), false).unwrap_err();
        assert_eq!(errors.first_message(), Some("Xu must be a number"));
    }

    #[test]
    fn test_validate_draft_bool_kind() {
        let fields = vec![FieldSpec::boolean("isActive", "Is Active")];
        let errors = validate_draft(&fields, &draft(json!({"isActive": "maybe"})), false).unwrap_err();
        assert_eq!(errors.first_message(), Some("Is Active must be yes or no"));
        assert!(validate_draft(&fields, &draft(json!({"isActive": false})), false).is_ok());
    }
}
