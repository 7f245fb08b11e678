//! # Filters
//!
//! Comparison operators and their translation into wire filters.
//! Equality against null or NaN has no comparison form on the wire and
//! becomes a unary `IS_NULL`/`IS_NAN` filter instead.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value as Json};

use crate::errors::{FirestoreError, FirestoreResult};
use crate::path::FieldPath;
use crate::value::{encode, Value};

/// Comparison operator of a `where` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
    ArrayContainsAny,
    In,
    NotIn,
}

impl FilterOperator {
    /// Operator as written in `where` expressions
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "==",
            FilterOperator::NotEqual => "!=",
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEqual => "<=",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::ArrayContains => "array-contains",
            FilterOperator::ArrayContainsAny => "array-contains-any",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not-in",
        }
    }

    /// Wire enum name
    pub fn wire_name(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "EQUAL",
            FilterOperator::NotEqual => "NOT_EQUAL",
            FilterOperator::LessThan => "LESS_THAN",
            FilterOperator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            FilterOperator::GreaterThan => "GREATER_THAN",
            FilterOperator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            FilterOperator::ArrayContains => "ARRAY_CONTAINS",
            FilterOperator::ArrayContainsAny => "ARRAY_CONTAINS_ANY",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT_IN",
        }
    }

    /// Operators whose operand is a list of candidates
    fn takes_list(&self) -> bool {
        matches!(
            self,
            FilterOperator::ArrayContainsAny | FilterOperator::In | FilterOperator::NotIn
        )
    }
}

impl FromStr for FilterOperator {
    type Err = FirestoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "==" => FilterOperator::Equal,
            "!=" => FilterOperator::NotEqual,
            "<" => FilterOperator::LessThan,
            "<=" => FilterOperator::LessThanOrEqual,
            ">" => FilterOperator::GreaterThan,
            ">=" => FilterOperator::GreaterThanOrEqual,
            "array-contains" => FilterOperator::ArrayContains,
            "array-contains-any" => FilterOperator::ArrayContainsAny,
            "in" => FilterOperator::In,
            "not-in" => FilterOperator::NotIn,
            other => {
                return Err(FirestoreError::usage(format!(
                    "unknown filter operator '{}'",
                    other
                )))
            }
        })
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One `field op value` comparison
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    field: FieldPath,
    op: FilterOperator,
    value: Value,
}

impl FieldFilter {
    /// Validate and build a comparison
    pub fn new(field: &str, op: FilterOperator, value: impl Into<Value>) -> FirestoreResult<Self> {
        let field = FieldPath::parse(field)?;
        let value = value.into();

        if op.takes_list() {
            match &value {
                Value::Array(items) if !items.is_empty() => {}
                _ => {
                    return Err(FirestoreError::usage(format!(
                        "'{}' requires a non-empty array operand",
                        op
                    )))
                }
            }
        }
        if is_null_or_nan(&value) && !matches!(op, FilterOperator::Equal | FilterOperator::NotEqual) {
            return Err(FirestoreError::usage(format!(
                "null and NaN only support '==' and '!=', got '{}'",
                op
            )));
        }

        Ok(Self { field, op, value })
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn op(&self) -> FilterOperator {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Wire `Filter` for this comparison
    pub fn to_json(&self) -> FirestoreResult<Json> {
        let field = json!({ "fieldPath": self.field.canonical() });
        let negate = self.op == FilterOperator::NotEqual;

        let unary = match &self.value {
            Value::Null => Some(if negate { "IS_NOT_NULL" } else { "IS_NULL" }),
            Value::Double(d) if d.is_nan() => Some(if negate { "IS_NOT_NAN" } else { "IS_NAN" }),
            _ => None,
        };

        Ok(match unary {
            Some(op) => json!({ "unaryFilter": { "op": op, "field": field } }),
            None => json!({
                "fieldFilter": {
                    "field": field,
                    "op": self.op.wire_name(),
                    "value": encode(&self.value)?.to_json(),
                }
            }),
        })
    }
}

fn is_null_or_nan(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Double(d) => d.is_nan(),
        _ => false,
    }
}

/// Conjunction of filters; `None` when there are none
pub fn conjunction(filters: &[FieldFilter]) -> FirestoreResult<Option<Json>> {
    match filters {
        [] => Ok(None),
        [only] => only.to_json().map(Some),
        many => {
            let parts = many
                .iter()
                .map(FieldFilter::to_json)
                .collect::<FirestoreResult<Vec<_>>>()?;
            Ok(Some(json!({
                "compositeFilter": { "op": "AND", "filters": parts }
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse_and_display() {
        for symbol in [
            "==", "!=", "<", "<=", ">", ">=", "array-contains", "array-contains-any", "in", "not-in",
        ] {
            let op: FilterOperator = symbol.parse().unwrap();
            assert_eq!(op.to_string(), symbol);
        }
        assert!("=~".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn test_field_filter_json() {
        let filter = FieldFilter::new("score", FilterOperator::LessThan, 40).unwrap();
        assert_eq!(
            filter.to_json().unwrap(),
            json!({"fieldFilter": {
                "field": {"fieldPath": "score"},
                "op": "LESS_THAN",
                "value": {"integerValue": "40"}
            }})
        );
    }

    #[test]
    fn test_null_equality_is_unary() {
        let eq = FieldFilter::new("deleted_at", FilterOperator::Equal, Value::Null).unwrap();
        assert_eq!(eq.to_json().unwrap()["unaryFilter"]["op"], json!("IS_NULL"));

        let ne = FieldFilter::new("ratio", FilterOperator::NotEqual, f64::NAN).unwrap();
        assert_eq!(ne.to_json().unwrap()["unaryFilter"]["op"], json!("IS_NOT_NAN"));
    }

    #[test]
    fn test_null_ordering_rejected() {
        assert!(FieldFilter::new("x", FilterOperator::LessThan, Value::Null).is_err());
    }

    #[test]
    fn test_list_operators_need_arrays() {
        assert!(FieldFilter::new("tag", FilterOperator::In, "a").is_err());
        assert!(FieldFilter::new("tag", FilterOperator::In, Vec::<Value>::new()).is_err());

        let filter = FieldFilter::new("tag", FilterOperator::In, vec!["a", "b"]).unwrap();
        assert_eq!(
            filter.to_json().unwrap()["fieldFilter"]["value"],
            json!({"arrayValue": {"values": [{"stringValue": "a"}, {"stringValue": "b"}]}})
        );
    }

    #[test]
    fn test_conjunction_shapes() {
        assert!(conjunction(&[]).unwrap().is_none());

        let a = FieldFilter::new("active", FilterOperator::Equal, true).unwrap();
        let b = FieldFilter::new("score", FilterOperator::GreaterThanOrEqual, 10).unwrap();
        assert!(conjunction(&[a.clone()]).unwrap().unwrap().get("fieldFilter").is_some());

        let both = conjunction(&[a, b]).unwrap().unwrap();
        assert_eq!(both["compositeFilter"]["op"], json!("AND"));
        assert_eq!(both["compositeFilter"]["filters"].as_array().unwrap().len(), 2);
    }
}
