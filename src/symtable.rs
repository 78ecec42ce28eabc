//! Lexical scopes and their symbol histories.
//!
//! Scopes live in a [`ScopeArena`] and refer to their parent by [`ScopeId`].
//! A binding keeps every node ever inserted under its identifier; the most
//! recent one is the current value.
//!
//! Lifetimes are tracked with two counters per scope: whether its owner has
//! closed it, and how many live child scopes name it as parent. A slot is
//! reclaimed once it is closed and has no dependents, which in turn releases
//! its parent. Class scopes are closed when the last [`ScopeLease`] held by
//! their instance is dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::interpreter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Main,
    Class,
    Function,
}

bitflags! {
    /// Metadata carried by a binding; flags from repeated inserts accumulate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SymbolFlags: u8 {
        const PARAMETER = 1 << 0;
        const PROPERTY = 1 << 1;
        const METHOD = 1 << 2;
        const BUILTIN = 1 << 3;
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    first: Node,
    later: Vec<Node>,
    scope: ScopeId,
    flags: SymbolFlags,
}

impl Symbol {
    /// Current binding: the latest entry of the history.
    pub fn node(&self) -> &Node {
        self.later.last().unwrap_or(&self.first)
    }

    pub fn history(&self) -> impl Iterator<Item = &Node> {
        std::iter::once(&self.first).chain(self.later.iter())
    }

    pub fn history_len(&self) -> usize {
        1 + self.later.len()
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn flags(&self) -> SymbolFlags {
        self.flags
    }
}

#[derive(Debug)]
struct ScopeRecord {
    identifier: String,
    kind: ScopeKind,
    symbols: FxHashMap<String, Symbol>,
    parent: Option<ScopeId>,
    dependents: usize,
    closed: bool,
}

/// Keeps a class scope open until dropped.
pub struct ScopeLease {
    scope: ScopeId,
    released: Rc<RefCell<Vec<ScopeId>>>,
}

impl ScopeLease {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl fmt::Debug for ScopeLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopeLease").field(&self.scope).finish()
    }
}

impl Drop for ScopeLease {
    fn drop(&mut self) {
        self.released.borrow_mut().push(self.scope);
    }
}

pub struct ScopeArena {
    slots: Vec<Option<ScopeRecord>>,
    free: Vec<u32>,
    released: Rc<RefCell<Vec<ScopeId>>>,
    main: ScopeId,
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeArena {
    /// Creates an arena holding a single Main scope.
    pub fn new() -> Self {
        let main = ScopeRecord {
            identifier: "main".to_string(),
            kind: ScopeKind::Main,
            symbols: FxHashMap::default(),
            parent: None,
            dependents: 0,
            closed: false,
        };
        Self {
            slots: vec![Some(main)],
            free: Vec::new(),
            released: Rc::new(RefCell::new(Vec::new())),
            main: ScopeId(0),
        }
    }

    pub fn main(&self) -> ScopeId {
        self.main
    }

    pub fn open(&mut self, kind: ScopeKind, identifier: &str, parent: ScopeId) -> ScopeId {
        self.record_mut(parent).dependents += 1;
        let record = ScopeRecord {
            identifier: identifier.to_string(),
            kind,
            symbols: FxHashMap::default(),
            parent: Some(parent),
            dependents: 0,
            closed: false,
        };
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(record);
                ScopeId(index)
            }
            None => {
                let index = u32::try_from(self.slots.len()).expect("scope arena exhausted");
                self.slots.push(Some(record));
                ScopeId(index)
            }
        };
        trace!(scope = %id, parent = %parent, ?kind, identifier, "open scope");
        id
    }

    /// Marks a scope as finished; it is reclaimed once no child scope needs it.
    pub fn close(&mut self, id: ScopeId) {
        let record = self.record_mut(id);
        record.closed = true;
        trace!(scope = %id, dependents = record.dependents, "close scope");
        self.collect(id);
    }

    pub fn lease(&self, id: ScopeId) -> ScopeLease {
        ScopeLease {
            scope: id,
            released: Rc::clone(&self.released),
        }
    }

    /// Closes every scope whose lease has been dropped since the last call.
    pub fn collect_released(&mut self) {
        loop {
            let next = self.released.borrow_mut().pop();
            let Some(id) = next else {
                break;
            };
            self.close(id);
        }
    }

    pub fn kind(&self, id: ScopeId) -> ScopeKind {
        self.record(id).kind
    }

    pub fn identifier(&self, id: ScopeId) -> &str {
        &self.record(id).identifier
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.record(id).parent
    }

    /// Number of scopes currently holding a slot, the Main scope included.
    pub fn live_scopes(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Appends `nodes` to the local history of `identifier`, creating it if needed.
    pub fn insert(
        &mut self,
        scope: ScopeId,
        identifier: &str,
        nodes: impl IntoIterator<Item = Node>,
        flags: SymbolFlags,
    ) {
        let record = self.record_mut(scope);
        trace!(scope = %scope, identifier, ?flags, "insert symbol");
        if let Some(symbol) = record.symbols.get_mut(identifier) {
            symbol.later.extend(nodes);
            symbol.flags |= flags;
            return;
        }
        let mut nodes = nodes.into_iter();
        let Some(first) = nodes.next() else {
            return;
        };
        record.symbols.insert(
            identifier.to_string(),
            Symbol {
                first,
                later: nodes.collect(),
                scope,
                flags,
            },
        );
    }

    pub fn lookup_local(&self, scope: ScopeId, identifier: &str) -> Option<&Symbol> {
        self.record(scope).symbols.get(identifier)
    }

    /// Resolves `identifier` from `scope` outward through its parents.
    pub fn lookup(&self, scope: ScopeId, identifier: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let record = self.record(id);
            if let Some(symbol) = record.symbols.get(identifier) {
                return Some(symbol);
            }
            current = record.parent;
        }
        None
    }

    fn collect(&mut self, id: ScopeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            let record = self.record(id);
            if !record.closed || record.dependents > 0 || record.kind == ScopeKind::Main {
                break;
            }
            let parent = record.parent;
            trace!(
                scope = %id,
                kind = ?self.kind(id),
                identifier = self.identifier(id),
                "free scope"
            );
            let freed = self.slots[id.index()].take();
            self.free.push(id.0);
            if let Some(parent) = parent {
                self.record_mut(parent).dependents -= 1;
            }
            // Dropping the record may release leases of instances it held.
            drop(freed);
            current = parent;
        }
    }

    fn record(&self, id: ScopeId) -> &ScopeRecord {
        self.slots[id.index()]
            .as_ref()
            .expect("scope handle must be live")
    }

    fn record_mut(&mut self, id: ScopeId) -> &mut ScopeRecord {
        self.slots[id.index()]
            .as_mut()
            .expect("scope handle must be live")
    }
}
