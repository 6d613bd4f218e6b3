//! Scalar values and the records built from them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Position of a record in a [`RecordStore`](crate::RecordStore).
pub type SlotId = usize;

/// A scalar field value.
///
/// `Null` is the sentinel for a missing value. Values are totally ordered so
/// they can key an index: `Null < Bool < numbers < Str`, where `Int` and
/// `Float` compare numerically with each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing or unknown.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 text.
    Str(String),
}

/// The variant of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::Float`]
    Float,
    /// [`Value::Str`]
    Str,
}

impl ValueKind {
    /// Whether a value may be stored in a field declared with this kind.
    /// `Null` is accepted everywhere and integers widen to floats.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ValueKind::Float, Value::Int(_)) => true,
            (kind, value) => kind == value.kind(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Variant tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
        }
    }

    /// True for the `Null` sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The integer payload, if this is an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payload as a float; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrowed text, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Str(_) => 3,
        }
    }
}

/// Orders floats by value, with `-0.0 == 0.0`; NaNs sit at the ends by sign.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// Exact comparison of an integer against a float.
fn cmp_int_float(a: i64, b: f64) -> Ordering {
    if b.is_nan() {
        return if b.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    match (a as f64).partial_cmp(&b) {
        // `b` is integral and within 2^63 here, so the i128 cast is exact.
        Some(Ordering::Equal) | None => (a as i128).cmp(&(b as i128)),
        Some(ord) => ord,
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => cmp_f64(*a, *b),
            (Value::Int(a), Value::Float(b)) => cmp_int_float(*a, *b),
            (Value::Float(a), Value::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Float(v) => {
                // Integral floats must hash like the equal `Int`.
                if v.fract() == 0.0 && *v >= -9.223_372_036_854_775_808e18 && *v < 9.223_372_036_854_775_808e18 {
                    (*v as i64).hash(state);
                } else {
                    state.write_u64(v.to_bits());
                }
            }
            Value::Str(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A named set of scalar fields. Only indexed fields are inspected by the
/// store; everything else is carried as payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Record with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Value of `field`, if set.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets `field`, returning the previous value if there was one.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Drops `field`, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Whether `field` is set, even to `Null`.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn numeric_values_compare_across_variants() {
        assert!(Value::Int(12) < Value::Float(15.0));
        assert!(Value::Float(12.5) > Value::Int(12));
        assert_eq!(Value::Int(20), Value::Float(20.0));
        assert_eq!(hash_of(&Value::Int(20)), hash_of(&Value::Float(20.0)));
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));
    }

    #[test]
    fn int_float_comparison_is_exact_near_the_limits() {
        assert!(Value::Int(i64::MAX) < Value::Float(9.223_372_036_854_775_808e18));
        assert!(Value::Int((1 << 53) + 1) > Value::Float((1u64 << 53) as f64));
    }

    #[test]
    fn nan_is_ordered_not_panicking() {
        let nan = Value::Float(f64::NAN);
        assert!(nan > Value::Float(f64::INFINITY));
        assert!(nan > Value::Int(i64::MAX));
        assert_eq!(nan.cmp(&nan), Ordering::Equal);
    }

    #[test]
    fn ranks_order_mixed_kinds() {
        let mut values = vec![
            Value::from("a"),
            Value::Int(3),
            Value::Null,
            Value::Bool(true),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![Value::Null, Value::Bool(true), Value::Int(3), Value::from("a")]
        );
    }

    #[test]
    fn kind_acceptance_widens_ints() {
        assert!(ValueKind::Float.accepts(&Value::Int(3)));
        assert!(ValueKind::Int.accepts(&Value::Null));
        assert!(!ValueKind::Int.accepts(&Value::Float(3.5)));
        assert!(!ValueKind::Str.accepts(&Value::Bool(false)));
    }

    #[test]
    fn record_builder_and_json_shape() {
        let record = Record::new().with("appid", 7).with("name", "portal");
        assert_eq!(record.get("appid"), Some(&Value::Int(7)));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"appid":7,"name":"portal"}"#);
    }

    #[test]
    fn record_field_removal() {
        let mut record = Record::new().with("appid", 7).with("name", "portal");
        assert_eq!(record.remove("name"), Some(Value::from("portal")));
        assert_eq!(record.remove("name"), None);
        assert!(!record.contains("name"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn accessors_match_only_their_variant() {
        assert_eq!(Value::from("valve").as_str(), Some("valve"));
        assert_eq!(Value::Int(4).as_str(), None);
        assert_eq!(Value::Int(4).as_i64(), Some(4));
        assert_eq!(Value::Int(4).as_f64(), Some(4.0));
        assert_eq!(Value::Null.as_f64(), None);
    }
}
