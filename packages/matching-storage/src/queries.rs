use time::OffsetDateTime;

use matching_domain::{Candidate, Category, NewProfile, Profile, QueryProjection};

use crate::{
	Error, Result,
	db::Db,
	models::{CandidateRow, ProfileRow},
};

const PROFILE_COLUMNS: &str = "\
matching_id,
	member_id,
	category,
	most_active_time,
	level,
	age,
	is_attending,
	introduction,
	status,
	version,
	created_at,
	updated_at";

/// Inserts `profile` unless its owner already has `limit` active profiles in the same category.
///
/// Count and insert share one transaction holding an advisory lock on the owner and category, so
/// concurrent creators for the same pair are serialized.
pub async fn insert_profile_limited(
	db: &Db,
	profile: &NewProfile,
	limit: u32,
	now: OffsetDateTime,
) -> Result<Profile> {
	let mut tx = db.pool.begin().await?;
	let lock_key = format!("matching:{}:{}", profile.member_id(), profile.category().as_str());

	sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
		.bind(lock_key.as_str())
		.execute(&mut *tx)
		.await?;

	let active: i64 = sqlx::query_scalar(
		"\
SELECT COUNT(*)
FROM matching_profiles
WHERE member_id = $1 AND category = $2 AND status = 'ACTIVE'",
	)
	.bind(profile.member_id())
	.bind(profile.category().as_str())
	.fetch_one(&mut *tx)
	.await?;

	if active >= i64::from(limit) {
		return Err(Error::LimitExceeded {
			member_id: profile.member_id(),
			category: profile.category().as_str().to_string(),
			limit,
		});
	}

	let sql = format!(
		"\
INSERT INTO matching_profiles (
	member_id,
	category,
	most_active_time,
	level,
	age,
	is_attending,
	introduction,
	status,
	version,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, 'ACTIVE', 0, $8, $8)
RETURNING {PROFILE_COLUMNS}"
	);
	let row: ProfileRow = sqlx::query_as(&sql)
		.bind(profile.member_id())
		.bind(profile.category().as_str())
		.bind(profile.most_active_time().as_str())
		.bind(profile.level().as_str())
		.bind(profile.age().as_str())
		.bind(profile.is_attending())
		.bind(profile.introduction())
		.bind(now)
		.fetch_one(&mut *tx)
		.await?;

	tx.commit().await?;

	row.into_profile()
}

/// Writes the mutable fields of `profile` if the stored version still equals `profile.version()`.
/// Returns the post-image with the bumped version.
pub async fn update_profile_versioned(
	db: &Db,
	profile: &Profile,
	now: OffsetDateTime,
) -> Result<Profile> {
	let sql = format!(
		"\
UPDATE matching_profiles
SET
	most_active_time = $1,
	level = $2,
	age = $3,
	is_attending = $4,
	introduction = $5,
	status = $6,
	version = version + 1,
	updated_at = $7
WHERE matching_id = $8 AND version = $9
RETURNING {PROFILE_COLUMNS}"
	);
	let row: Option<ProfileRow> = sqlx::query_as(&sql)
		.bind(profile.most_active_time().as_str())
		.bind(profile.level().as_str())
		.bind(profile.age().as_str())
		.bind(profile.is_attending())
		.bind(profile.introduction())
		.bind(profile.status().as_str())
		.bind(now)
		.bind(profile.matching_id())
		.bind(profile.version())
		.fetch_optional(&db.pool)
		.await?;
	let Some(row) = row else {
		return Err(Error::VersionConflict {
			matching_id: profile.matching_id(),
			expected: profile.version(),
		});
	};

	row.into_profile()
}

pub async fn find_profile(db: &Db, matching_id: i64) -> Result<Option<Profile>> {
	let sql = format!("SELECT {PROFILE_COLUMNS} FROM matching_profiles WHERE matching_id = $1");
	let row: Option<ProfileRow> =
		sqlx::query_as(&sql).bind(matching_id).fetch_optional(&db.pool).await?;

	row.map(ProfileRow::into_profile).transpose()
}

/// Newest first. Deleted profiles are included.
pub async fn list_by_category_and_member(
	db: &Db,
	category: Category,
	member_id: i64,
) -> Result<Vec<Profile>> {
	let sql = format!(
		"\
SELECT {PROFILE_COLUMNS}
FROM matching_profiles
WHERE category = $1 AND member_id = $2
ORDER BY matching_id DESC"
	);
	let rows: Vec<ProfileRow> = sqlx::query_as(&sql)
		.bind(category.as_str())
		.bind(member_id)
		.fetch_all(&db.pool)
		.await?;

	rows.into_iter().map(ProfileRow::into_profile).collect()
}

pub async fn list_by_member(db: &Db, member_id: i64) -> Result<Vec<Profile>> {
	let sql = format!(
		"SELECT {PROFILE_COLUMNS} FROM matching_profiles WHERE member_id = $1 ORDER BY matching_id DESC"
	);
	let rows: Vec<ProfileRow> = sqlx::query_as(&sql).bind(member_id).fetch_all(&db.pool).await?;

	rows.into_iter().map(ProfileRow::into_profile).collect()
}

/// Scores every active profile in the reference category against `reference` and returns those
/// with at least one equal attribute, best first.
pub async fn find_candidates(db: &Db, reference: &QueryProjection) -> Result<Vec<Candidate>> {
	let rows: Vec<CandidateRow> = sqlx::query_as(
		"\
SELECT *
FROM (
	SELECT
		matching_id,
		member_id,
		category,
		most_active_time,
		level,
		age,
		is_attending,
		introduction,
		status,
		(
			CASE WHEN most_active_time = $3 THEN 1 ELSE 0 END
			+ CASE WHEN level = $4 THEN 1 ELSE 0 END
			+ CASE WHEN age = $5 THEN 1 ELSE 0 END
			+ CASE WHEN is_attending = $6 THEN 1 ELSE 0 END
		)::int4 AS score
	FROM matching_profiles
	WHERE status = 'ACTIVE'
		AND category = $1
		AND member_id <> $2
		AND ($5 = 'NONE' OR age = $5)
) scored
WHERE score >= 1
ORDER BY score DESC, member_id ASC, matching_id ASC",
	)
	.bind(reference.category.as_str())
	.bind(reference.member_id)
	.bind(reference.most_active_time.as_str())
	.bind(reference.level.as_str())
	.bind(reference.age.as_str())
	.bind(reference.is_attending)
	.fetch_all(&db.pool)
	.await?;

	rows.into_iter().map(CandidateRow::into_candidate).collect()
}
