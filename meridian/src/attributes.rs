//! Attribute records of dataset features.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Scalar value of a feature attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Absent value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl AttributeValue {
    /// Returns true for [`AttributeValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Text that attribute queries compare against.
    ///
    /// This is the form the values were shown in by the desktop tool the datasets usually come from: floats always
    /// have a fractional part or an exponent (`1234.0`, `0.1`, `1e+16`), booleans are `True`/`False` and null is
    /// `None`. Integers and texts are the same as in [`Display`].
    pub fn query_text(&self) -> String {
        match self {
            AttributeValue::Null => "None".to_string(),
            AttributeValue::Bool(true) => "True".to_string(),
            AttributeValue::Bool(false) => "False".to_string(),
            AttributeValue::Integer(v) => v.to_string(),
            AttributeValue::Float(v) => float_text(*v),
            AttributeValue::Text(v) => v.clone(),
        }
    }
}

fn float_text(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value == f64::INFINITY {
        return "inf".to_string();
    }
    if value == f64::NEG_INFINITY {
        return "-inf".to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        // Shortest mantissa with a signed exponent of at least two digits: `1e+16`, `1.5e-05`.
        let formatted = format!("{value:e}");
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// String representation used for display.
///
/// `Null` is an empty string, floats use the shortest representation that round-trips (`3.5`, `1`, `0.1`).
impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::Integer(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Ordered mapping of field names to values.
///
/// Field order is the order of insertion, which is the column order of the attribute table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    fields: Vec<(String, AttributeValue)>,
}

impl Attributes {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the field, `None` if the record has no such field.
    pub fn get(&self, field: &str) -> Option<&AttributeValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Sets the value of the field. Existing fields keep their position.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<AttributeValue>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Builder-style version of [`Attributes::insert`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Iterates over `(field, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Names of the fields in field order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if both records have the same set of fields, regardless of their order.
    pub fn has_same_fields(&self, other: &Attributes) -> bool {
        self.field_set() == other.field_set()
    }

    pub(crate) fn field_set(&self) -> BTreeSet<&str> {
        self.field_names().collect()
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = Attributes::new();
        for (field, value) in iter {
            attributes.insert(field, value);
        }

        attributes
    }
}
