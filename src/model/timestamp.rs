//! Serde helpers for UNIX millisecond timestamps carried on the wire.

// crates.io
use serde::{Deserializer, Serializer, de::Error as _};
// self
use crate::_prelude::*;

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Converts an instant into whole UNIX milliseconds.
pub fn to_millis(instant: OffsetDateTime) -> i64 {
	let millis = instant.unix_timestamp_nanos() / NANOS_PER_MILLI;

	i64::try_from(millis).unwrap_or(if millis.is_negative() { i64::MIN } else { i64::MAX })
}

/// Converts UNIX milliseconds into an instant, rejecting out-of-range values.
pub fn from_millis(millis: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
	OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI)
}

/// `#[serde(with = "...")]` adapter for optional millisecond timestamps.
pub mod option {
	// self
	use super::*;

	/// Serializes an optional instant as UNIX milliseconds.
	pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(instant) => serializer.serialize_some(&to_millis(*instant)),
			None => serializer.serialize_none(),
		}
	}

	/// Deserializes optional UNIX milliseconds into an instant.
	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<i64>::deserialize(deserializer)?
			.map(|millis| from_millis(millis).map_err(D::Error::custom))
			.transpose()
	}
}
