//! URL query strings with type markers
//!
//! Each value carries a marker telling the receiving form parser how to
//! convert it back: `age:int=3`, `tags:list=a&tags:list=b`,
//! `user.name:record=jo`. Text is always percent-encoded as UTF-8.

use std::fmt;

/// A scalar query value
#[derive(Clone, Debug, PartialEq)]
pub enum QueryScalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl QueryScalar {
    fn marker(&self) -> &'static str {
        match self {
            QueryScalar::Text(_) => "",
            QueryScalar::Int(_) => ":int",
            QueryScalar::Float(_) => ":float",
            QueryScalar::Bool(_) => ":boolean",
        }
    }
}

impl fmt::Display for QueryScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryScalar::Text(s) => f.write_str(s),
            QueryScalar::Int(i) => write!(f, "{}", i),
            // Debug keeps the trailing `.0` on whole numbers
            QueryScalar::Float(x) => write!(f, "{:?}", x),
            QueryScalar::Bool(true) => f.write_str("True"),
            QueryScalar::Bool(false) => f.write_str("False"),
        }
    }
}

/// A value passed for one query name
#[derive(Clone, Debug, PartialEq)]
pub enum QueryValue {
    Scalar(QueryScalar),
    List(Vec<QueryScalar>),
    Record(Vec<(String, QueryScalar)>),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Scalar(QueryScalar::Text(value.to_string()))
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Scalar(QueryScalar::Text(value))
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Scalar(QueryScalar::Int(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Scalar(QueryScalar::Float(value))
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Scalar(QueryScalar::Bool(value))
    }
}

impl From<Vec<QueryScalar>> for QueryValue {
    fn from(values: Vec<QueryScalar>) -> Self {
        QueryValue::List(values)
    }
}

/// Expand `(name, value)` pairs into `(name, marker, value)` triples.
///
/// Lists repeat the name once per item; records become one `name.field`
/// entry per field.
pub fn complex_marshal(pairs: &[(String, QueryValue)]) -> Vec<(String, String, QueryScalar)> {
    let mut out = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        match value {
            QueryValue::Scalar(scalar) => {
                out.push((name.clone(), scalar.marker().to_string(), scalar.clone()));
            }
            QueryValue::List(items) => {
                for item in items {
                    out.push((name.clone(), format!("{}:list", item.marker()), item.clone()));
                }
            }
            QueryValue::Record(fields) => {
                for (field, item) in fields {
                    out.push((
                        format!("{}.{}", name, field),
                        format!("{}:record", item.marker()),
                        item.clone(),
                    ));
                }
            }
        }
    }
    out
}

/// Build a marshalled query string from ordered pairs
pub fn make_query(pairs: &[(String, QueryValue)]) -> String {
    complex_marshal(pairs)
        .into_iter()
        .map(|(name, marker, value)| {
            format!(
                "{}{}={}",
                urlencoding::encode(&name),
                marker,
                urlencoding::encode(&value.to_string())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Merge several pair lists, later names replacing earlier values in place,
/// and build the query string.
pub fn make_query_merged(
    dicts: &[Vec<(String, QueryValue)>],
    kwargs: &[(String, QueryValue)],
) -> String {
    let mut merged: Vec<(String, QueryValue)> = Vec::new();
    for (name, value) in dicts.iter().flatten().chain(kwargs.iter()) {
        match merged.iter_mut().find(|(existing, _)| existing == name) {
            Some(slot) => slot.1 = value.clone(),
            None => merged.push((name.clone(), value.clone())),
        }
    }
    make_query(&merged)
}
