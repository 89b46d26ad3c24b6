//! Symbol/type index
//!
//! The index maps the local type definitions of every session in a project
//! to a shareable form. Each row is tagged with its *source*: the analysis
//! database path of the session that contributed it. A push from a session
//! is authoritative for that source, which makes merges idempotent and
//! order-insensitive across sources.

mod sqlite;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::host::HostEnvironment;

pub use sqlite::{TypeIndex, INDEX_FILE_NAME};

/// A single named type declaration as the host renders it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    pub definition: String,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }
}

/// The type definitions contributed by one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSet {
    /// Database path of the contributing session
    pub source: String,
    /// Type name -> definition
    pub types: BTreeMap<String, String>,
}

impl TypeSet {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            types: BTreeMap::new(),
        }
    }

    pub fn from_definitions<I>(source: impl Into<String>, definitions: I) -> Self
    where
        I: IntoIterator<Item = TypeDefinition>,
    {
        Self {
            source: source.into(),
            types: definitions
                .into_iter()
                .map(|t| (t.name, t.definition))
                .collect(),
        }
    }

    pub fn with_type(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.types.insert(name.into(), definition.into());
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn definitions(&self) -> impl Iterator<Item = TypeDefinition> + '_ {
        self.types
            .iter()
            .map(|(name, definition)| TypeDefinition::new(name, definition))
    }
}

/// Outcome of merging a received type set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Index rows created for the source
    pub added: usize,
    /// Index rows whose definition changed
    pub updated: usize,
    /// Index rows dropped because the source no longer has them
    pub removed: usize,
    /// Definitions handed to the host's local type library
    pub imported: usize,
}

/// Operations the sync coordinator performs on the session's index
pub trait SymbolIndex {
    /// Source tag of this session's own rows
    fn source(&self) -> &str;

    /// Index the host's local types under this session's source.
    ///
    /// With `purge_locally_deleted`, rows this session indexed earlier that
    /// no longer exist locally are dropped. Returns the indexed set, ready
    /// to be pushed.
    fn index_local_types(
        &mut self,
        host: &dyn HostEnvironment,
        purge_locally_deleted: bool,
    ) -> Result<TypeSet>;

    /// Merge a set received from another session into the index and the
    /// host's local type library.
    ///
    /// With `purge_non_indexed`, rows of `incoming.source` not present in
    /// the set are dropped.
    fn sync_types_into_database(
        &mut self,
        host: &dyn HostEnvironment,
        incoming: &TypeSet,
        purge_non_indexed: bool,
    ) -> Result<MergeStats>;

    /// All rows currently indexed for `source`
    fn types_from(&self, source: &str) -> Result<BTreeMap<String, String>>;

    /// Release the underlying store
    fn close(self: Box<Self>) -> Result<()>;
}
