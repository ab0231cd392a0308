pub fn render_schema() -> &'static str {
	include_str!("../../../sql/init.sql")
}

/// Statements of the schema in file order, without blank fragments.
pub fn statements() -> impl Iterator<Item = &'static str> {
	render_schema().split(';').map(str::trim).filter(|statement| !statement.is_empty())
}

#[cfg(test)]
mod tests {
	#[test]
	fn schema_splits_into_table_and_indexes() {
		let statements = super::statements().collect::<Vec<_>>();

		assert_eq!(statements.len(), 3);
		assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS matching_profiles"));
		assert!(statements.iter().skip(1).all(|s| s.starts_with("CREATE INDEX IF NOT EXISTS")));
	}
}
