//! Embedded SQL migrations

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// All embedded migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_release_ledger",
            sql: include_str!("../../migrations/001_release_ledger.sql"),
        },
        Migration {
            id: "002_packages_metrics",
            sql: include_str!("../../migrations/002_packages_metrics.sql"),
        },
    ]
}
