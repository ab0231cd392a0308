use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which profile field a parameter error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterCode {
	MatchingId,
	MemberId,
	Category,
	MostActiveTime,
	Level,
	Age,
	IsAttending,
	Introduction,
	Status,
}
impl ParameterCode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::MatchingId => "INVALID_MATCHING_ID",
			Self::MemberId => "INVALID_MEMBER_ID",
			Self::Category => "INVALID_CATEGORY_ID",
			Self::MostActiveTime => "INVALID_MOST_ACTIVE_TIME_ID",
			Self::Level => "INVALID_LEVEL_ID",
			Self::Age => "INVALID_AGE_ID",
			Self::IsAttending => "INVALID_IS_ATTENDING",
			Self::Introduction => "INVALID_INTRODUCTION",
			Self::Status => "INVALID_STATUS",
		}
	}
}
impl fmt::Display for ParameterCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
	Study,
	Hobby,
	Mentoring,
}
impl Category {
	pub const ALL: [Self; 3] = [Self::Study, Self::Hobby, Self::Mentoring];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Study => "STUDY",
			Self::Hobby => "HOBBY",
			Self::Mentoring => "MENTORING",
		}
	}

	pub fn description(self) -> &'static str {
		match self {
			Self::Study => "Study group",
			Self::Hobby => "Hobby group",
			Self::Mentoring => "Mentoring",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MostActiveTime {
	Morning,
	Afternoon,
	Evening,
	Dawn,
}
impl MostActiveTime {
	pub const ALL: [Self; 4] = [Self::Morning, Self::Afternoon, Self::Evening, Self::Dawn];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Morning => "MORNING",
			Self::Afternoon => "AFTERNOON",
			Self::Evening => "EVENING",
			Self::Dawn => "DAWN",
		}
	}

	pub fn description(self) -> &'static str {
		match self {
			Self::Morning => "Morning 06:00 to 12:00",
			Self::Afternoon => "Afternoon 12:00 to 18:00",
			Self::Evening => "Evening 18:00 to 00:00",
			Self::Dawn => "Dawn 00:00 to 06:00",
		}
	}
}

/// Self-declared proficiency, ordered from beginner to expert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
	Seed,
	Seedling,
	Sapling,
	Blooming,
	Fruitful,
}
impl Level {
	pub const ALL: [Self; 5] =
		[Self::Seed, Self::Seedling, Self::Sapling, Self::Blooming, Self::Fruitful];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Seed => "SEED",
			Self::Seedling => "SEEDLING",
			Self::Sapling => "SAPLING",
			Self::Blooming => "BLOOMING",
			Self::Fruitful => "FRUITFUL",
		}
	}

	/// 1 for `Seed` through 5 for `Fruitful`.
	pub fn ordinal(self) -> u8 {
		match self {
			Self::Seed => 1,
			Self::Seedling => 2,
			Self::Sapling => 3,
			Self::Blooming => 4,
			Self::Fruitful => 5,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Seed => "Seed",
			Self::Seedling => "Seedling",
			Self::Sapling => "Sapling",
			Self::Blooming => "Blooming",
			Self::Fruitful => "Fruitful",
		}
	}

	pub fn description(self) -> &'static str {
		match self {
			Self::Seed => "Complete beginner meeting the concepts for the first time.",
			Self::Seedling => "Building fundamentals and able to finish simple tasks.",
			Self::Sapling => "Uses it day to day and is gaining problem-solving experience.",
			Self::Blooming => "Applies it fluently across many situations.",
			Self::Fruitful => "Expert level, comfortable with advanced material.",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Age {
	Teens,
	Twenties,
	Thirties,
	Forties,
	Fifties,
	Sixties,
	/// Not specified. A reference with this value matches every age.
	None,
}
impl Age {
	pub const ALL: [Self; 7] = [
		Self::Teens,
		Self::Twenties,
		Self::Thirties,
		Self::Forties,
		Self::Fifties,
		Self::Sixties,
		Self::None,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Teens => "TEENS",
			Self::Twenties => "TWENTIES",
			Self::Thirties => "THIRTIES",
			Self::Forties => "FORTIES",
			Self::Fifties => "FIFTIES",
			Self::Sixties => "SIXTIES",
			Self::None => "NONE",
		}
	}

	pub fn description(self) -> &'static str {
		match self {
			Self::Teens => "10s",
			Self::Twenties => "20s",
			Self::Thirties => "30s",
			Self::Forties => "40s",
			Self::Fifties => "50s",
			Self::Sixties => "60s and over",
			Self::None => "No preference",
		}
	}

	pub fn is_specified(self) -> bool {
		self != Self::None
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileStatus {
	Active,
	Deleted,
}
impl ProfileStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Active => "ACTIVE",
			Self::Deleted => "DELETED",
		}
	}
}

impl FromStr for Category {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		Self::ALL
			.into_iter()
			.find(|value| value.as_str() == raw)
			.ok_or_else(|| Error::invalid(ParameterCode::Category, format!("Unknown category {raw:?}.")))
	}
}

impl FromStr for MostActiveTime {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		Self::ALL.into_iter().find(|value| value.as_str() == raw).ok_or_else(|| {
			Error::invalid(ParameterCode::MostActiveTime, format!("Unknown active time {raw:?}."))
		})
	}
}

impl FromStr for Level {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		Self::ALL
			.into_iter()
			.find(|value| value.as_str() == raw)
			.ok_or_else(|| Error::invalid(ParameterCode::Level, format!("Unknown level {raw:?}.")))
	}
}

impl FromStr for Age {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		Self::ALL
			.into_iter()
			.find(|value| value.as_str() == raw)
			.ok_or_else(|| Error::invalid(ParameterCode::Age, format!("Unknown age {raw:?}.")))
	}
}

impl FromStr for ProfileStatus {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		match raw {
			"ACTIVE" => Ok(Self::Active),
			"DELETED" => Ok(Self::Deleted),
			_ =>
				Err(Error::invalid(ParameterCode::Status, format!("Unknown profile status {raw:?}."))),
		}
	}
}
