use matching_domain::SignalLookup;

use crate::{Result, cache::RedisCache};

pub fn trust_score_key(member_id: i64) -> String {
	format!("member:trust:score:{member_id}")
}

pub fn subscription_key(member_id: i64) -> String {
	format!("member:subscription:{member_id}")
}

/// Per-member trust and subscription lookups, in input order.
///
/// Missing or unparsable values come back as `None`; callers decide the default.
pub async fn fetch_signals(cache: &RedisCache, member_ids: &[i64]) -> Result<Vec<SignalLookup>> {
	if member_ids.is_empty() {
		return Ok(Vec::new());
	}

	let trust_keys = member_ids.iter().copied().map(trust_score_key).collect::<Vec<_>>();
	let subscription_keys = member_ids.iter().copied().map(subscription_key).collect::<Vec<_>>();
	let mut conn = cache.connection();
	let (trust, subscribed): (Vec<Option<String>>, Vec<Option<String>>) = cache
		.bounded(
			"signal lookup",
			redis::pipe()
				.cmd("MGET")
				.arg(&trust_keys)
				.cmd("MGET")
				.arg(&subscription_keys)
				.query_async(&mut conn),
		)
		.await?;

	Ok(trust
		.into_iter()
		.zip(subscribed)
		.map(|(trust, subscribed)| SignalLookup {
			trust_score: trust.as_deref().and_then(parse_trust_score),
			subscribed: subscribed.as_deref().and_then(parse_subscription),
		})
		.collect())
}

pub fn parse_trust_score(raw: &str) -> Option<f64> {
	raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn parse_subscription(raw: &str) -> Option<bool> {
	match raw.trim() {
		"true" | "TRUE" | "True" | "1" => Some(true),
		"false" | "FALSE" | "False" | "0" => Some(false),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keys_use_literal_formats() {
		assert_eq!(trust_score_key(12), "member:trust:score:12");
		assert_eq!(subscription_key(12), "member:subscription:12");
	}

	#[test]
	fn unparsable_values_are_misses() {
		assert_eq!(parse_trust_score("98.5"), Some(98.5));
		assert_eq!(parse_trust_score("NaN"), None);
		assert_eq!(parse_trust_score("high"), None);
		assert_eq!(parse_subscription("1"), Some(true));
		assert_eq!(parse_subscription("false"), Some(false));
		assert_eq!(parse_subscription("yes"), None);
	}
}
