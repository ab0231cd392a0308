use serde::{Deserialize, Deserializer};

/// A field of a partial update.
///
/// `Absent` means the key was not sent and the stored value stays as it is. `Null` means the key
/// was sent with an explicit `null`, which is a request to clear the value and is validated like
/// any other input. Use together with `#[serde(default)]` on the containing struct so that missing
/// keys land on `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
	#[default]
	Absent,
	Null,
	Value(T),
}
impl<T> Patch<T> {
	pub fn is_absent(&self) -> bool {
		matches!(self, Self::Absent)
	}

	/// `None` when absent, `Some(None)` for an explicit null.
	pub fn into_change(self) -> Option<Option<T>> {
		match self {
			Self::Absent => None,
			Self::Null => Some(None),
			Self::Value(value) => Some(Some(value)),
		}
	}
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
	T: Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(match Option::<T>::deserialize(deserializer)? {
			Some(value) => Self::Value(value),
			None => Self::Null,
		})
	}
}

#[cfg(test)]
mod tests {
	use serde::Deserialize;

	use super::*;

	#[derive(Debug, Default, Deserialize)]
	#[serde(default)]
	struct Body {
		level: Patch<String>,
		introduction: Patch<String>,
	}

	#[test]
	fn distinguishes_missing_null_and_value() {
		let body: Body = serde_json::from_str(r#"{"introduction":null}"#)
			.expect("Failed to parse patch body.");

		assert_eq!(body.level, Patch::Absent);
		assert_eq!(body.introduction, Patch::Null);

		let body: Body =
			serde_json::from_str(r#"{"level":"SEED"}"#).expect("Failed to parse patch body.");

		assert_eq!(body.level, Patch::Value("SEED".to_string()));
		assert!(body.introduction.is_absent());
	}

	#[test]
	fn into_change_nests_options() {
		assert_eq!(Patch::<u8>::Absent.into_change(), None);
		assert_eq!(Patch::<u8>::Null.into_change(), Some(None));
		assert_eq!(Patch::Value(3_u8).into_change(), Some(Some(3)));
	}
}
