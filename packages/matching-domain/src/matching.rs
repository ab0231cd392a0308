use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Age, Category, Level, MostActiveTime, Profile, ProfileStatus};

pub const MAX_SCORE: u8 = 4;

/// The attributes a candidate query needs from a reference profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryProjection {
	pub member_id: i64,
	pub category: Category,
	pub most_active_time: MostActiveTime,
	pub level: Level,
	pub age: Age,
	pub is_attending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
	pub matching_id: i64,
	pub member_id: i64,
	pub category: Category,
	pub most_active_time: MostActiveTime,
	pub level: Level,
	pub age: Age,
	pub is_attending: bool,
	pub introduction: String,
	pub status: ProfileStatus,
	pub score: u8,
}
impl Candidate {
	pub fn projection(&self) -> QueryProjection {
		QueryProjection {
			member_id: self.member_id,
			category: self.category,
			most_active_time: self.most_active_time,
			level: self.level,
			age: self.age,
			is_attending: self.is_attending,
		}
	}
}

/// Trust and subscription read from the member signal cache.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MemberSignal {
	pub trust_score: f64,
	pub subscribed: bool,
}

/// Raw cache read for one member. Either half may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalLookup {
	pub trust_score: Option<f64>,
	pub subscribed: Option<bool>,
}
impl SignalLookup {
	pub fn is_complete(&self) -> bool {
		self.trust_score.is_some() && self.subscribed.is_some()
	}

	/// Missing halves fall back to `0.0` and `false`.
	pub fn resolve(self) -> MemberSignal {
		MemberSignal {
			trust_score: self.trust_score.unwrap_or(0.0),
			subscribed: self.subscribed.unwrap_or(false),
		}
	}
}

/// Number of equal attributes among active time, level, age and attendance.
pub fn score(a: &QueryProjection, b: &QueryProjection) -> u8 {
	u8::from(a.most_active_time == b.most_active_time)
		+ u8::from(a.level == b.level)
		+ u8::from(a.age == b.age)
		+ u8::from(a.is_attending == b.is_attending)
}

/// Whether `target` is eligible for `reference` before scoring.
pub fn is_eligible(reference: &QueryProjection, target: &Profile) -> bool {
	target.is_active()
		&& target.member_id() != reference.member_id
		&& target.category() == reference.category
		&& (!reference.age.is_specified() || target.age() == reference.age)
}

/// Filters, scores and orders profiles for `reference`.
///
/// Rows with a zero score are dropped. Ties on score are broken by member id and then matching id,
/// both ascending.
pub fn rank_candidates<'a, I>(reference: &QueryProjection, profiles: I) -> Vec<Candidate>
where
	I: IntoIterator<Item = &'a Profile>,
{
	let mut candidates = profiles
		.into_iter()
		.filter(|profile| is_eligible(reference, profile))
		.filter_map(|profile| {
			let score = score(reference, &profile.projection());

			(score >= 1).then(|| Candidate {
				matching_id: profile.matching_id(),
				member_id: profile.member_id(),
				category: profile.category(),
				most_active_time: profile.most_active_time(),
				level: profile.level(),
				age: profile.age(),
				is_attending: profile.is_attending(),
				introduction: profile.introduction().to_string(),
				status: profile.status(),
				score,
			})
		})
		.collect::<Vec<_>>();

	candidates.sort_by(candidate_order);

	candidates
}

pub fn candidate_order(a: &Candidate, b: &Candidate) -> Ordering {
	b.score
		.cmp(&a.score)
		.then_with(|| a.member_id.cmp(&b.member_id))
		.then_with(|| a.matching_id.cmp(&b.matching_id))
}

/// Stable sort by trust descending, then subscribed first, keeping the incoming order within equal
/// buckets, then truncate to `top_k`. `signals[i]` belongs to `candidates[i]`.
pub fn rerank(
	candidates: Vec<Candidate>,
	signals: &[MemberSignal],
	top_k: usize,
) -> Vec<(Candidate, MemberSignal)> {
	let mut paired = candidates
		.into_iter()
		.enumerate()
		.map(|(idx, candidate)| {
			let signal = signals.get(idx).copied().unwrap_or_default();

			(candidate, signal)
		})
		.collect::<Vec<_>>();

	paired.sort_by(|(_, a), (_, b)| {
		b.trust_score.total_cmp(&a.trust_score).then_with(|| b.subscribed.cmp(&a.subscribed))
	});
	paired.truncate(top_k);

	paired
}
