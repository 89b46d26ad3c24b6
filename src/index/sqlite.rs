//! SQLite-backed type index
//!
//! The index file lives in the project's metadata directory and is shared by
//! every session of the project on this machine. Each session only ever
//! writes rows for its own source, plus rows for sources it received pushes
//! from.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{MergeStats, SymbolIndex, TypeDefinition, TypeSet};
use crate::error::Result;
use crate::host::HostEnvironment;

/// File name of the index inside the metadata directory
pub const INDEX_FILE_NAME: &str = "index.sqlite";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS types (
    source     TEXT NOT NULL,
    name       TEXT NOT NULL,
    definition TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (source, name)
);
";

const UPSERT: &str = "
INSERT INTO types (source, name, definition, updated_at) VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(source, name) DO UPDATE
    SET definition = excluded.definition, updated_at = excluded.updated_at
";

/// Type index for one session
pub struct TypeIndex {
    conn: Connection,
    source: String,
}

impl std::fmt::Debug for TypeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeIndex")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl TypeIndex {
    /// Open (or create) the index file at `path` for the session `source`
    pub fn open(path: &Path, source: impl Into<String>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn, source.into())
    }

    /// Private index that is discarded when dropped
    pub fn open_in_memory(source: impl Into<String>) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, source.into())
    }

    fn init(conn: Connection, source: String) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("[INDEX] Opened type index for {}", source);
        Ok(Self { conn, source })
    }

    /// Replace the rows of `set.source` with `set.types`.
    ///
    /// Only rows whose definition differs are written. With `purge`, rows of
    /// the source absent from the set are deleted.
    fn store(&mut self, set: &TypeSet, purge: bool) -> Result<MergeStats> {
        let existing = self.types_from(&set.source)?;
        let mut stats = MergeStats::default();
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        {
            let mut upsert = tx.prepare_cached(UPSERT)?;
            for (name, definition) in &set.types {
                match existing.get(name) {
                    Some(old) if old == definition => continue,
                    Some(_) => stats.updated += 1,
                    None => stats.added += 1,
                }
                upsert.execute(params![set.source, name, definition, now])?;
            }

            if purge {
                let mut delete =
                    tx.prepare_cached("DELETE FROM types WHERE source = ?1 AND name = ?2")?;
                for name in existing.keys().filter(|n| !set.types.contains_key(*n)) {
                    delete.execute(params![set.source, name])?;
                    stats.removed += 1;
                }
            }
        }
        tx.commit()?;

        Ok(stats)
    }

    /// When rows of `source` last changed
    pub fn last_updated(&self, source: &str) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<String> = self
            .conn
            .query_row(
                "SELECT MAX(updated_at) FROM types WHERE source = ?1",
                params![source],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        Ok(latest
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc)))
    }

    /// Every source with at least one indexed row
    pub fn sources(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT DISTINCT source FROM types ORDER BY source")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }
}

impl SymbolIndex for TypeIndex {
    fn source(&self) -> &str {
        &self.source
    }

    fn index_local_types(
        &mut self,
        host: &dyn HostEnvironment,
        purge_locally_deleted: bool,
    ) -> Result<TypeSet> {
        let set = TypeSet::from_definitions(self.source.clone(), host.local_types());
        let stats = self.store(&set, purge_locally_deleted)?;
        tracing::debug!(
            "[INDEX] Indexed {} local types ({} new, {} changed, {} purged)",
            set.len(),
            stats.added,
            stats.updated,
            stats.removed
        );
        Ok(set)
    }

    fn sync_types_into_database(
        &mut self,
        host: &dyn HostEnvironment,
        incoming: &TypeSet,
        purge_non_indexed: bool,
    ) -> Result<MergeStats> {
        if incoming.source == self.source {
            tracing::debug!("[INDEX] Ignoring type set from own source");
            return Ok(MergeStats::default());
        }

        let mut stats = self.store(incoming, purge_non_indexed)?;

        // The index file may already hold these rows (another session on this
        // machine wrote them), so compare against the host's library instead.
        let local: BTreeMap<String, String> = host
            .local_types()
            .into_iter()
            .map(|t| (t.name, t.definition))
            .collect();
        let to_import: Vec<TypeDefinition> = incoming
            .definitions()
            .filter(|t| local.get(&t.name) != Some(&t.definition))
            .collect();

        if !to_import.is_empty() {
            host.import_types(&to_import)?;
        }
        stats.imported = to_import.len();

        tracing::debug!(
            "[INDEX] Merged {} types from {} ({} imported, {} purged)",
            incoming.len(),
            incoming.source,
            stats.imported,
            stats.removed
        );
        Ok(stats)
    }

    fn types_from(&self, source: &str) -> Result<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name, definition FROM types WHERE source = ?1")?;
        let rows = stmt.query_map(params![source], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    fn close(self: Box<Self>) -> Result<()> {
        let source = self.source;
        self.conn.close().map_err(|(_, e)| e)?;
        tracing::debug!("[INDEX] Closed type index for {}", source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::tempdir;

    #[derive(Default)]
    struct LibraryHost {
        types: RefCell<BTreeMap<String, String>>,
        imports: RefCell<usize>,
    }

    impl LibraryHost {
        fn define(&self, name: &str, definition: &str) {
            self.types
                .borrow_mut()
                .insert(name.to_string(), definition.to_string());
        }
    }

    impl HostEnvironment for LibraryHost {
        fn current_binary_path(&self) -> Option<std::path::PathBuf> {
            None
        }

        fn auto_analysis_complete(&self) -> bool {
            true
        }

        fn local_types(&self) -> Vec<TypeDefinition> {
            self.types
                .borrow()
                .iter()
                .map(|(n, d)| TypeDefinition::new(n, d))
                .collect()
        }

        fn import_types(&self, types: &[TypeDefinition]) -> Result<()> {
            *self.imports.borrow_mut() += 1;
            for t in types {
                self.define(&t.name, &t.definition);
            }
            Ok(())
        }
    }

    #[test]
    fn test_index_local_types_purges_deleted() {
        let host = LibraryHost::default();
        host.define("A", "struct A {};");
        host.define("B", "struct B {};");

        let mut index = TypeIndex::open_in_memory("/p/a.exe.i64").unwrap();
        index.index_local_types(&host, true).unwrap();
        assert_eq!(index.types_from("/p/a.exe.i64").unwrap().len(), 2);

        host.types.borrow_mut().remove("B");
        let set = index.index_local_types(&host, true).unwrap();
        assert_eq!(set.types.keys().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(
            index
                .types_from("/p/a.exe.i64")
                .unwrap()
                .keys()
                .collect::<Vec<_>>(),
            vec!["A"]
        );
    }

    #[test]
    fn test_index_without_purge_keeps_stale_rows() {
        let host = LibraryHost::default();
        host.define("A", "struct A {};");
        let mut index = TypeIndex::open_in_memory("/p/a.exe.i64").unwrap();
        index.index_local_types(&host, false).unwrap();

        host.types.borrow_mut().clear();
        index.index_local_types(&host, false).unwrap();
        assert_eq!(index.types_from("/p/a.exe.i64").unwrap().len(), 1);
    }

    #[test]
    fn test_merge_replaces_source_rows_and_imports() {
        let host = LibraryHost::default();
        let mut index = TypeIndex::open_in_memory("/p/b.dll.i64").unwrap();

        let first = TypeSet::new("/p/a.exe.i64")
            .with_type("T1", "typedef int T1;")
            .with_type("T2", "typedef char T2;");
        let stats = index.sync_types_into_database(&host, &first, true).unwrap();
        assert_eq!(stats.added, 2);
        assert_eq!(stats.imported, 2);

        let second = TypeSet::new("/p/a.exe.i64").with_type("T1", "typedef long T1;");
        let stats = index.sync_types_into_database(&host, &second, true).unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.imported, 1);

        let rows = index.types_from("/p/a.exe.i64").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows["T1"], "typedef long T1;");
        assert_eq!(host.types.borrow()["T1"], "typedef long T1;");
    }

    #[test]
    fn test_merge_identical_set_imports_nothing() {
        let host = LibraryHost::default();
        let mut index = TypeIndex::open_in_memory("/p/b.dll.i64").unwrap();
        let set = TypeSet::new("/p/a.exe.i64").with_type("T1", "typedef int T1;");

        index.sync_types_into_database(&host, &set, true).unwrap();
        let again = index.sync_types_into_database(&host, &set, true).unwrap();

        assert_eq!(again, MergeStats::default());
        assert_eq!(*host.imports.borrow(), 1);
    }

    #[test]
    fn test_merge_ignores_own_source() {
        let host = LibraryHost::default();
        let mut index = TypeIndex::open_in_memory("/p/a.exe.i64").unwrap();
        let set = TypeSet::new("/p/a.exe.i64").with_type("T1", "typedef int T1;");

        let stats = index.sync_types_into_database(&host, &set, true).unwrap();
        assert_eq!(stats, MergeStats::default());
        assert!(index.sources().unwrap().is_empty());
    }

    #[test]
    fn test_shared_file_between_sessions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE_NAME);
        let host_a = LibraryHost::default();
        host_a.define("T1", "typedef int T1;");
        let host_b = LibraryHost::default();

        let mut a = TypeIndex::open(&path, "/p/a.exe.i64").unwrap();
        let mut b = TypeIndex::open(&path, "/p/b.dll.i64").unwrap();

        let pushed = a.index_local_types(&host_a, true).unwrap();
        let stats = b.sync_types_into_database(&host_b, &pushed, true).unwrap();

        // Rows were already written by `a`, but `b`'s host still needs them.
        assert_eq!(stats.added, 0);
        assert_eq!(stats.imported, 1);
        assert_eq!(host_b.types.borrow()["T1"], "typedef int T1;");
        assert_eq!(b.sources().unwrap().len(), 1);
    }

    #[test]
    fn test_last_updated_tracks_writes() {
        let host = LibraryHost::default();
        host.define("A", "struct A {};");
        let mut index = TypeIndex::open_in_memory("/p/a.exe.i64").unwrap();
        assert!(index.last_updated("/p/a.exe.i64").unwrap().is_none());

        let before = Utc::now();
        index.index_local_types(&host, true).unwrap();
        let stamp = index.last_updated("/p/a.exe.i64").unwrap().unwrap();
        assert!(stamp >= before - chrono::Duration::seconds(1));
    }
}
