use crate::validation::FieldRule;
use serde_json::Value;
use std::sync::Arc;

/// Input widget and value type of a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Password,
    Number,
    Bool,
    /// Single value chosen from another collection's ids.
    Select { source: String },
    /// Several ids from another collection.
    MultiSelect { source: String },
}

impl FieldKind {
    /// Collection the options of a select field come from.
    pub fn option_source(&self) -> Option<&str> {
        match self {
            Self::Select { source } | Self::MultiSelect { source } => Some(source),
            _ => None,
        }
    }
}

/// One declared form field with its validation table.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Message reported when the field is blank. `None` means optional.
    pub required: Option<String>,
    pub rules: Vec<Arc<dyn FieldRule>>,
    /// Only shown and validated when creating.
    pub create_only: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: None,
            rules: Vec::new(),
            create_only: false,
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn text_area(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::TextArea)
    }

    pub fn password(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Password)
    }

    pub fn number(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Bool)
    }

    pub fn select(name: impl Into<String>, label: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Select { source: source.into() })
    }

    pub fn multi_select(
        name: impl Into<String>,
        label: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self::new(name, label, FieldKind::MultiSelect { source: source.into() })
    }

    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    pub fn rule(mut self, rule: impl FieldRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    /// Converts text typed into an input into a draft value.
    ///
    /// Blank input yields `None` (the field is left out of the draft).
    /// Unparseable numbers are kept as text so validation can report them.
    pub fn parse_input(&self, raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let value = match &self.kind {
            FieldKind::Number => {
                if let Ok(int) = trimmed.parse::<i64>() {
                    Value::from(int)
                } else if let Some(number) = trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                {
                    Value::Number(number)
                } else {
                    Value::String(trimmed.to_string())
                }
            }
            FieldKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" | "on" => Value::Bool(true),
                "false" | "no" | "n" | "0" | "off" => Value::Bool(false),
                _ => Value::String(trimmed.to_string()),
            },
            FieldKind::MultiSelect { .. } => Value::Array(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect(),
            ),
            // Passwords and free text keep inner whitespace as typed.
            FieldKind::Text | FieldKind::TextArea | FieldKind::Password => {
                Value::String(raw.to_string())
            }
            FieldKind::Select { .. } => Value::String(trimmed.to_string()),
        };

        Some(value)
    }

    /// Text shown in an input for a draft value.
    pub fn display_value(&self, value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    Value::Object(map) => map
                        .get("_id")
                        .or_else(|| map.get("id"))
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .unwrap_or_default(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::Object(map)) => map
                .get("_id")
                .or_else(|| map.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
            Some(other) => other.to_string(),
        }
    }
}

/// A choice offered by a select field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub id: String,
    pub label: String,
}
