//! Thin accessors over `json` objects that report the failing key.

use json::JsonValue;

pub type JsonResult<T> = Result<T, JsonError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JsonError {
	#[error("Key {0:?} does not exist")]
	KeyDoesNotExist(String),
	#[error("Value at {0:?} is not an object")]
	ValueIsNotObject(String),
	#[error("Value at {0:?} is not a string")]
	ValueIsNotString(String),
	#[error("Value at {0:?} is not a number")]
	ValueIsNotNumber(String),
	#[error("Value at {0:?} is not a bool")]
	ValueIsNotBool(String),
	#[error("Error while parsing int at {0:?}\n  - number out of scope")]
	ParseIntError(String),
	#[error("Error in object at {key:?}\n  - {inner}")]
	ErrorInObject { key: String, inner: Box<JsonError> },
}

impl JsonError {
	pub fn nested(self, key: &str) -> Self {
		Self::ErrorInObject {
			key: key.to_owned(),
			inner: Box::new(self),
		}
	}
}

#[derive(Clone, Copy)]
pub struct JsonObject<'a>(pub &'a json::object::Object);

impl<'a> JsonObject<'a> {
	pub fn from_value(key: &str, value: &'a JsonValue) -> JsonResult<Self> {
		match value {
			JsonValue::Object(obj) => Ok(JsonObject(obj)),
			_ => Err(JsonError::ValueIsNotObject(key.to_owned())),
		}
	}

	fn get(&self, key: &str) -> JsonResult<&'a JsonValue> {
		match self.0.get(key) {
			Some(value) => Ok(value),
			None => Err(JsonError::KeyDoesNotExist(key.to_owned())),
		}
	}

	/// `true` if `key` is present and not `null`.
	pub fn has(&self, key: &str) -> bool {
		self.0.get(key).map_or(false, |value| !value.is_null())
	}

	pub fn get_object(&self, key: &str) -> JsonResult<JsonObject<'a>> {
		JsonObject::from_value(key, self.get(key)?)
	}

	pub fn get_str(&self, key: &str) -> JsonResult<&'a str> {
		match self.get(key)?.as_str() {
			Some(val) => Ok(val),
			None => Err(JsonError::ValueIsNotString(key.to_owned())),
		}
	}

	fn get_number(&self, key: &str) -> JsonResult<json::number::Number> {
		match self.get(key)?.as_number() {
			Some(val) => Ok(val),
			None => Err(JsonError::ValueIsNotNumber(key.to_owned())),
		}
	}

	pub fn get_f32(&self, key: &str) -> JsonResult<f32> {
		Ok(self.get_number(key)?.into())
	}

	pub fn get_u32(&self, key: &str) -> JsonResult<u32> {
		self.get_number(key)?
			.try_into()
			.map_err(|_| JsonError::ParseIntError(key.to_owned()))
	}

	pub fn get_bool(&self, key: &str) -> JsonResult<bool> {
		match self.get(key)?.as_bool() {
			Some(val) => Ok(val),
			None => Err(JsonError::ValueIsNotBool(key.to_owned())),
		}
	}
}
