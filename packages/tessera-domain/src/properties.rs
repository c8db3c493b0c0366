use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// A single flattened property value. Graph storage only accepts primitives;
/// anything structured is carried as serialized JSON.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
	Bool(bool),
	Integer(i64),
	Float(f64),
	Text(String),
	/// Serialized JSON for values the store cannot hold natively.
	Serialized(String),
}
impl PropertyValue {
	pub fn into_json(self) -> Value {
		match self {
			Self::Bool(value) => Value::Bool(value),
			Self::Integer(value) => Value::from(value),
			Self::Float(value) => Value::from(value),
			Self::Text(value) | Self::Serialized(value) => Value::String(value),
		}
	}
}

/// Flattens extractor output to primitive values. Nulls are dropped; nested
/// objects and arrays are serialized to JSON strings.
pub fn flatten(properties: &Map<String, Value>) -> BTreeMap<String, PropertyValue> {
	let mut out = BTreeMap::new();

	for (key, value) in properties {
		let Some(flattened) = flatten_value(value) else {
			continue;
		};

		out.insert(key.clone(), flattened);
	}

	out
}

pub fn to_json_map(properties: BTreeMap<String, PropertyValue>) -> Map<String, Value> {
	properties.into_iter().map(|(key, value)| (key, value.into_json())).collect()
}

fn flatten_value(value: &Value) -> Option<PropertyValue> {
	match value {
		Value::Null => None,
		Value::Bool(inner) => Some(PropertyValue::Bool(*inner)),
		Value::Number(number) => {
			if let Some(integer) = number.as_i64() {
				Some(PropertyValue::Integer(integer))
			} else {
				number.as_f64().map(PropertyValue::Float)
			}
		},
		Value::String(text) => Some(PropertyValue::Text(text.clone())),
		Value::Array(_) | Value::Object(_) =>
			serde_json::to_string(value).ok().map(PropertyValue::Serialized),
	}
}
