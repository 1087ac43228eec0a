//! Describe the migration catalog.
use strum::IntoEnumIterator;

use crate::catalog::MigrationId;

/// One `id<TAB>description` line per migration.
pub fn execute() -> String {
    MigrationId::iter()
        .map(|id| format!("{id}\t{}\n", id.description()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_migration() {
        let listing = execute();

        assert_eq!(listing.lines().count(), MigrationId::iter().count());
        assert!(listing.starts_with("node-version\t"));
        assert!(listing.contains("exclude-update-package\t"));
    }
}
