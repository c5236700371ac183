//! Typed configuration fields
//!
//! Every block carries a configuration record whose fields are declared once,
//! in order, as a constant [`FieldSpec`] table. The same table drives
//! validation when a field is set and the field order of the generated
//! declaration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Whole number, optionally bounded
    Integer,
    /// Floating point number
    Float,
    /// Free text, quoted when emitted
    Text,
    /// User-authored code, emitted verbatim
    Expression,
    /// Boolean choice, emitted as `True`/`False`
    Flag,
    /// Path on disk, quoted with backslashes doubled
    FilePath,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Text => "text",
            FieldKind::Expression => "expression",
            FieldKind::Flag => "flag",
            FieldKind::FilePath => "file path",
        };
        f.write_str(name)
    }
}

/// A field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Expression(String),
    Flag(bool),
    FilePath(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Expression(_) => FieldKind::Expression,
            FieldValue::Flag(_) => FieldKind::Flag,
            FieldValue::FilePath(_) => FieldKind::FilePath,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Text content of any string-like value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Expression(s) | FieldValue::FilePath(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a literal of the generated program
    pub fn render(&self) -> String {
        match self {
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Text(s) => format!("\"{}\"", s),
            FieldValue::Expression(s) => s.clone(),
            FieldValue::Flag(true) => "True".to_string(),
            FieldValue::Flag(false) => "False".to_string(),
            FieldValue::FilePath(s) => format!("\"{}\"", s.replace('\\', "\\\\")),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// Declaration of one configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Name as it appears in the generated program
    pub name: &'static str,
    pub kind: FieldKind,
    /// Inclusive lower bound (integers only)
    pub min: Option<i64>,
    /// Inclusive upper bound (integers only)
    pub max: Option<i64>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            min: None,
            max: None,
        }
    }

    pub const fn integer(name: &'static str, min: i64, max: Option<i64>) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
            min: Some(min),
            max,
        }
    }

    /// Check a value against this field and convert it to the field's kind.
    ///
    /// Integers widen to floats, and any string-like value is accepted by a
    /// string-like field. NaN and infinite floats have no program literal and
    /// are refused.
    pub fn check(&self, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let found = value.kind();
        let converted = match (self.kind, value) {
            (FieldKind::Integer, FieldValue::Integer(i)) => {
                self.check_range(i)?;
                FieldValue::Integer(i)
            }
            (FieldKind::Float, FieldValue::Float(f)) if !f.is_finite() => {
                return Err(ConfigError::InvalidText {
                    field: self.name.to_string(),
                    text: f.to_string(),
                })
            }
            (FieldKind::Float, FieldValue::Float(f)) => FieldValue::Float(f),
            (FieldKind::Float, FieldValue::Integer(i)) => FieldValue::Float(i as f64),
            (FieldKind::Flag, FieldValue::Flag(b)) => FieldValue::Flag(b),
            (
                FieldKind::Text,
                FieldValue::Text(s) | FieldValue::Expression(s) | FieldValue::FilePath(s),
            ) => FieldValue::Text(s),
            (
                FieldKind::Expression,
                FieldValue::Text(s) | FieldValue::Expression(s) | FieldValue::FilePath(s),
            ) => FieldValue::Expression(s),
            (
                FieldKind::FilePath,
                FieldValue::Text(s) | FieldValue::Expression(s) | FieldValue::FilePath(s),
            ) => FieldValue::FilePath(s),
            _ => {
                return Err(ConfigError::KindMismatch {
                    field: self.name.to_string(),
                    expected: self.kind,
                    found,
                })
            }
        };
        Ok(converted)
    }

    /// Parse text typed into a property editor into a value of this field
    pub fn parse(&self, text: &str) -> Result<FieldValue, ConfigError> {
        let invalid = || ConfigError::InvalidText {
            field: self.name.to_string(),
            text: text.to_string(),
        };
        let value = match self.kind {
            FieldKind::Integer => FieldValue::Integer(text.trim().parse().map_err(|_| invalid())?),
            FieldKind::Float => FieldValue::Float(text.trim().parse().map_err(|_| invalid())?),
            FieldKind::Flag => match text.trim() {
                "True" | "true" => FieldValue::Flag(true),
                "False" | "false" => FieldValue::Flag(false),
                _ => return Err(invalid()),
            },
            FieldKind::Text => FieldValue::Text(text.to_string()),
            FieldKind::Expression => FieldValue::Expression(text.to_string()),
            FieldKind::FilePath => FieldValue::FilePath(text.to_string()),
        };
        self.check(value)
    }

    fn check_range(&self, value: i64) -> Result<(), ConfigError> {
        let below = self.min.is_some_and(|min| value < min);
        let above = self.max.is_some_and(|max| value > max);
        if below || above {
            return Err(ConfigError::OutOfRange {
                field: self.name.to_string(),
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// A configuration record with a fixed, declared field order
pub trait ConfigRecord {
    /// Field declarations in emission order
    const FIELDS: &'static [FieldSpec];

    /// Current values, parallel to [`ConfigRecord::FIELDS`]
    fn values(&self) -> Vec<FieldValue>;

    /// Store a value that was already checked against `FIELDS[index]`
    fn store(&mut self, index: usize, value: FieldValue);

    fn get(&self, name: &str) -> Option<FieldValue> {
        let index = Self::FIELDS.iter().position(|f| f.name == name)?;
        self.values().into_iter().nth(index)
    }

    /// Set a field by name. The record is left unchanged on error.
    fn set(&mut self, name: &str, value: FieldValue) -> Result<(), ConfigError> {
        let index = field_index(Self::FIELDS, name)?;
        let checked = Self::FIELDS[index].check(value)?;
        self.store(index, checked);
        Ok(())
    }
}

/// Find a field by name in a declaration table
pub fn field_index(fields: &[FieldSpec], name: &str) -> Result<usize, ConfigError> {
    fields
        .iter()
        .position(|f| f.name == name)
        .ok_or_else(|| ConfigError::UnknownField(name.to_string()))
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// No field with this name on the block
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Value kind does not fit the field
    #[error("Field {field} expects a {expected} value, got {found}")]
    KindMismatch {
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },

    /// Integer outside the field's bounds
    #[error("Value {value} out of range for field {field}")]
    OutOfRange {
        field: String,
        value: i64,
        min: Option<i64>,
        max: Option<i64>,
    },

    /// Text that does not parse as the field's kind
    #[error("Cannot read {text:?} as a value for field {field}")]
    InvalidText { field: String, text: String },

    /// Block type name not recognised
    #[error("Unknown block kind: {0}")]
    UnknownKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_literals() {
        assert_eq!(FieldValue::Integer(-3).render(), "-3");
        assert_eq!(FieldValue::Float(1.2).render(), "1.2");
        assert_eq!(FieldValue::Float(0.01).render(), "0.01");
        assert_eq!(FieldValue::Text("clk".into()).render(), "\"clk\"");
        assert_eq!(FieldValue::Expression("lambda x: x".into()).render(), "lambda x: x");
        assert_eq!(FieldValue::Flag(true).render(), "True");
        assert_eq!(FieldValue::Flag(false).render(), "False");
    }

    #[test]
    fn test_file_path_doubles_backslashes() {
        let value = FieldValue::FilePath(r"C:\Tests\PWM.csv".into());
        assert_eq!(value.render(), r#""C:\\Tests\\PWM.csv""#);
    }

    #[test]
    fn test_check_range() {
        let field = FieldSpec::integer("initialValue", 0, Some(1));
        assert_eq!(field.check(1_i64.into()), Ok(FieldValue::Integer(1)));
        assert!(matches!(
            field.check(2_i64.into()),
            Err(ConfigError::OutOfRange { value: 2, .. })
        ));
        assert!(field.check((-1_i64).into()).is_err());
    }

    #[test]
    fn test_check_widens_and_converts() {
        let float = FieldSpec::new("onTime", FieldKind::Float);
        assert_eq!(float.check(2_i64.into()), Ok(FieldValue::Float(2.0)));

        let expr = FieldSpec::new("func", FieldKind::Expression);
        assert_eq!(
            expr.check("lambda x: 1".into()),
            Ok(FieldValue::Expression("lambda x: 1".into()))
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let flag = FieldSpec::new("plot", FieldKind::Flag);
        assert_eq!(
            flag.check("yes".into()),
            Err(ConfigError::KindMismatch {
                field: "plot".into(),
                expected: FieldKind::Flag,
                found: FieldKind::Text,
            })
        );
    }

    #[test]
    fn test_parse_text_entry() {
        let int = FieldSpec::integer("delay", 0, None);
        assert_eq!(int.parse(" 4 "), Ok(FieldValue::Integer(4)));
        assert!(matches!(int.parse("four"), Err(ConfigError::InvalidText { .. })));

        let flag = FieldSpec::new("plot", FieldKind::Flag);
        assert_eq!(flag.parse("True"), Ok(FieldValue::Flag(true)));
        assert!(flag.parse("maybe").is_err());
    }

    /// NaN and infinities cannot be written as program literals
    #[test]
    fn test_non_finite_floats_refused() {
        let float = FieldSpec::new("timePeriod", FieldKind::Float);
        for text in ["NaN", "inf", "-inf"] {
            assert!(
                matches!(float.parse(text), Err(ConfigError::InvalidText { .. })),
                "{} accepted",
                text
            );
        }
        assert!(float.check(f64::INFINITY.into()).is_err());
        assert_eq!(float.parse("2.5"), Ok(FieldValue::Float(2.5)));
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(FieldValue::Integer(3).as_integer(), Some(3));
        assert_eq!(FieldValue::Integer(3).as_float(), Some(3.0));
        assert_eq!(FieldValue::Flag(true).as_flag(), Some(true));
        assert_eq!(FieldValue::Expression("lambda x: x".into()).as_str(), Some("lambda x: x"));
        assert_eq!(FieldValue::Float(0.5).as_integer(), None);
        assert_eq!(FieldValue::Text("clk".into()).as_flag(), None);
    }

    #[test]
    fn test_field_index() {
        let fields = [
            FieldSpec::new("plot", FieldKind::Flag),
            FieldSpec::new("blockID", FieldKind::Text),
        ];
        assert_eq!(field_index(&fields, "blockID"), Ok(1));
        assert_eq!(
            field_index(&fields, "nope"),
            Err(ConfigError::UnknownField("nope".into()))
        );
    }
}
