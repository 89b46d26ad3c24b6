//! In-memory analysis host

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use continuum::{ContinuumError, HostEnvironment, Result, Session, SyncOutcome, TypeDefinition};

/// Host with a local type library and an optional binary.
///
/// When wired to a session, `import_types` fires the session's local change
/// hook synchronously, the way real hosts do.
#[derive(Default)]
pub struct FakeHost {
    binary: RefCell<Option<PathBuf>>,
    analysing: Cell<bool>,
    types: RefCell<BTreeMap<String, String>>,
    session: RefCell<Weak<Session>>,
    fail_imports: Cell<bool>,
    pub imports: Cell<usize>,
    pub focus_requests: Cell<usize>,
    /// Outcomes of hook calls fired from inside `import_types`
    pub hook_outcomes: RefCell<Vec<SyncOutcome>>,
}

impl FakeHost {
    pub fn new(binary: &Path) -> Rc<Self> {
        let host = Self::default();
        *host.binary.borrow_mut() = Some(binary.to_path_buf());
        Rc::new(host)
    }

    pub fn without_binary() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn set_analysing(&self, analysing: bool) {
        self.analysing.set(analysing);
    }

    pub fn fail_imports(&self, fail: bool) {
        self.fail_imports.set(fail);
    }

    /// Fire the session's local change hook from inside `import_types`
    pub fn wire(&self, session: &Rc<Session>) {
        *self.session.borrow_mut() = Rc::downgrade(session);
    }

    pub fn define(&self, name: &str, definition: &str) {
        self.types
            .borrow_mut()
            .insert(name.to_string(), definition.to_string());
    }

    pub fn undefine(&self, name: &str) {
        self.types.borrow_mut().remove(name);
    }

    pub fn definition(&self, name: &str) -> Option<String> {
        self.types.borrow().get(name).cloned()
    }

    pub fn type_count(&self) -> usize {
        self.types.borrow().len()
    }
}

impl HostEnvironment for FakeHost {
    fn current_binary_path(&self) -> Option<PathBuf> {
        self.binary.borrow().clone()
    }

    fn auto_analysis_complete(&self) -> bool {
        !self.analysing.get()
    }

    fn local_types(&self) -> Vec<TypeDefinition> {
        self.types
            .borrow()
            .iter()
            .map(|(name, definition)| TypeDefinition::new(name, definition))
            .collect()
    }

    fn import_types(&self, types: &[TypeDefinition]) -> Result<()> {
        if self.fail_imports.get() {
            return Err(ContinuumError::Index {
                message: "type library is locked".to_string(),
            });
        }

        for t in types {
            self.define(&t.name, &t.definition);
        }
        self.imports.set(self.imports.get() + 1);

        let session = self.session.borrow().upgrade();
        if let Some(session) = session {
            let outcome = session.on_local_type_change();
            self.hook_outcomes.borrow_mut().push(outcome);
        }
        Ok(())
    }

    fn bring_to_front(&self) {
        self.focus_requests.set(self.focus_requests.get() + 1);
    }
}
