//! The per-tree [`Root`] registry: arena ownership plus the three structural
//! indices it maintains alongside the arena.

use std::cell::RefCell;
use std::rc::Rc;

use glsl_grammar::SyntaxKind;
use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::arena::Arena;
use crate::arena::Child;
use crate::arena::NodeData;
use crate::arena::NodeId;
use crate::error::Error;
use crate::error::Result;

/// Selects how a [`Root`]'s three indices are maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Every insertion/removal updates all indices immediately, and iteration
    /// order within an index bucket matches insertion order.
    #[default]
    Exact,
    /// Indices are maintained, but ordering among equal-key entries is not
    /// part of the contract (callers must not depend on it, even though the
    /// backing store happens to preserve insertion order today).
    Unordered,
}

/// The concrete choice of per-index policy a [`Root`] is built with
/// §6.2's `RootSupplier`). The identifier index, node index, and
/// external-declaration index each get their own policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootSupplier {
    /// Policy for the identifier index.
    pub identifier: IndexPolicy,
    /// Policy for the node-kind index.
    pub node: IndexPolicy,
    /// Policy for the external-declaration index.
    pub external_declaration: IndexPolicy,
}

impl RootSupplier {
    /// `Exact` for all three indices.
    pub const DEFAULT: RootSupplier = RootSupplier {
        identifier: IndexPolicy::Exact,
        node: IndexPolicy::Exact,
        external_declaration: IndexPolicy::Exact,
    };

    /// `Unordered` identifier/node indices, `Exact` external-declaration
    /// index, read as "identifier and node indices unordered,
    /// external-declaration index exact".
    pub const EXACT_UNORDERED_ED_EXACT: RootSupplier = RootSupplier {
        identifier: IndexPolicy::Unordered,
        node: IndexPolicy::Unordered,
        external_declaration: IndexPolicy::Exact,
    };

    /// `Unordered` for all three indices — the cheapest policy, suited to
    /// one-shot bulk transforms that never rely on index iteration order.
    pub const ALL_UNORDERED: RootSupplier = RootSupplier {
        identifier: IndexPolicy::Unordered,
        node: IndexPolicy::Unordered,
        external_declaration: IndexPolicy::Unordered,
    };
}

impl Default for RootSupplier {
    fn default() -> Self {
        RootSupplier::DEFAULT
    }
}

/// A pending index mutation, queued while an
/// [`Root::index_build_session`] is open.
enum PendingOp {
    Register(NodeId),
    Unregister(NodeId),
}

/// The registry owned by a [`Root`]: the arena plus the three multimaps.
pub(crate) struct RootInner {
    pub(crate) arena: Arena,
    supplier: RootSupplier,
    identifier_index: IndexMap<String, IndexSet<NodeId>>,
    node_index: IndexMap<SyntaxKind, IndexSet<NodeId>>,
    external_declaration_index: IndexMap<String, IndexSet<NodeId>>,
    /// `Some` while an index build session is open; mutations are queued here
    /// instead of being applied immediately.
    pending: Option<Vec<PendingOp>>,
}

/// A per-tree index registry and node arena.
///
/// Cheap to clone: it is a reference-counted handle, following a
/// single-threaded-per-run ownership model (a `Root` is never shared live
/// across threads, only moved wholesale between sequential owners).
#[derive(Clone)]
pub struct Root(pub(crate) Rc<RefCell<RootInner>>);

impl Root {
    /// Creates an empty root using `supplier`'s index policies.
    pub fn new(supplier: RootSupplier) -> Self {
        Root(Rc::new(RefCell::new(RootInner {
            arena: Arena::new(),
            supplier,
            identifier_index: IndexMap::new(),
            node_index: IndexMap::new(),
            external_declaration_index: IndexMap::new(),
            pending: None,
        })))
    }

    /// Allocates a detached node (no parent, not yet registered with any
    /// index). Callers must attach it via [`crate::node::Node::setup`] before
    /// the node becomes reachable from indices.
    pub fn alloc(&self, data: NodeData) -> NodeId {
        self.0.borrow_mut().arena.alloc(data)
    }

    pub(crate) fn with_inner<T>(&self, f: impl FnOnce(&RootInner) -> T) -> T {
        f(&self.0.borrow())
    }

    pub(crate) fn with_inner_mut<T>(&self, f: impl FnOnce(&mut RootInner) -> T) -> T {
        f(&mut self.0.borrow_mut())
    }

    /// Registers `subtree`'s root and every descendant with the appropriate
    /// indices (identifier names, node kinds, and external-declaration
    /// ownership), recursively.
    pub(crate) fn register(&self, subtree: NodeId) {
        let mut inner = self.0.borrow_mut();
        inner.register_recursive(subtree);
    }

    /// Deregisters `subtree`'s root and every descendant from the indices,
    /// recursively. Does not touch arena storage.
    pub(crate) fn unregister(&self, subtree: NodeId) {
        let mut inner = self.0.borrow_mut();
        inner.unregister_recursive(subtree);
    }

    /// Runs `body` inside an index build session: register/unregister calls
    /// made by `body` are queued and flushed as one batch when `body`
    /// returns, including on an error/panic-free early return. This is the
    /// "build session" policy, used for bulk clone+insert operations.
    ///
    /// Net effect: a node registered then unregistered within the
    /// same session nets to nothing; the reverse order is only meaningful for
    /// nodes that existed before the session opened.
    pub fn index_build_session<T>(&self, body: impl FnOnce(&Root) -> T) -> T {
        tracing::trace!("opening index build session");
        {
            let mut inner = self.0.borrow_mut();
            assert!(inner.pending.is_none(), "index build sessions do not nest");
            inner.pending = Some(Vec::new());
        }
        let result = body(self);
        let pending = self.0.borrow_mut().pending.take().unwrap_or_default();
        tracing::trace!(ops = pending.len(), "flushing index build session");
        let mut inner = self.0.borrow_mut();
        for op in pending {
            match op {
                PendingOp::Register(id) => inner.register_recursive(id),
                PendingOp::Unregister(id) => inner.unregister_recursive(id),
            }
        }
        result
    }

    /// Looks up identifiers by current spelling.
    pub fn identifier_index(&self) -> Index<'_, String> {
        Index {
            root: self,
            key: IndexKind::Identifier,
            _marker: std::marker::PhantomData,
        }
    }

    /// Looks up nodes by kind.
    pub fn node_index(&self) -> Index<'_, SyntaxKind> {
        Index {
            root: self,
            key: IndexKind::Node,
            _marker: std::marker::PhantomData,
        }
    }

    /// Looks up external declarations by declared name.
    pub fn external_declaration_index(&self) -> Index<'_, String> {
        Index {
            root: self,
            key: IndexKind::ExternalDeclaration,
            _marker: std::marker::PhantomData,
        }
    }
}

impl RootInner {
    fn register_recursive(&mut self, id: NodeId) {
        let (kind, name, children): (SyntaxKind, Option<String>, Vec<NodeId>) = {
            let data = self.arena.get(id);
            (
                data.kind,
                if data.kind == SyntaxKind::Identifier {
                    data.text.clone()
                } else {
                    None
                },
                data.child_nodes().collect(),
            )
        };
        self.insert_into(IndexKind::Node, kind_key(kind), id);
        if let Some(name) = &name {
            self.insert_into(IndexKind::Identifier, name.clone(), id);
        }
        if is_external_declaration(kind) {
            for owned_name in external_declaration_names(&self.arena, id) {
                self.insert_into(IndexKind::ExternalDeclaration, owned_name, id);
            }
        }
        for child in children {
            self.register_recursive(child);
        }
    }

    fn unregister_recursive(&mut self, id: NodeId) {
        let (kind, name, children): (SyntaxKind, Option<String>, Vec<NodeId>) = {
            let data = self.arena.get(id);
            (
                data.kind,
                if data.kind == SyntaxKind::Identifier {
                    data.text.clone()
                } else {
                    None
                },
                data.child_nodes().collect(),
            )
        };
        self.remove_from(IndexKind::Node, &KeyRef::Kind(kind), id);
        if let Some(name) = &name {
            self.remove_from(IndexKind::Identifier, &KeyRef::Name(name), id);
        }
        if is_external_declaration(kind) {
            for owned_name in external_declaration_names(&self.arena, id) {
                self.remove_from(IndexKind::ExternalDeclaration, &KeyRef::Name(&owned_name), id);
            }
        }
        for child in children {
            self.unregister_recursive(child);
        }
    }

    fn insert_into(&mut self, which: IndexKind, key: impl Into<MapKey>, id: NodeId) {
        if self.pending.is_some() {
            self.pending.as_mut().unwrap().push(PendingOp::Register(id));
            return;
        }
        match (which, key.into()) {
            (IndexKind::Identifier, MapKey::Name(k)) => {
                self.identifier_index.entry(k).or_default().insert(id);
            }
            (IndexKind::Node, MapKey::Kind(k)) => {
                self.node_index.entry(k).or_default().insert(id);
            }
            (IndexKind::ExternalDeclaration, MapKey::Name(k)) => {
                self.external_declaration_index.entry(k).or_default().insert(id);
            }
            _ => unreachable!("index/key kind mismatch"),
        }
    }

    fn remove_from(&mut self, which: IndexKind, key: &KeyRef<'_>, id: NodeId) {
        if self.pending.is_some() {
            self.pending.as_mut().unwrap().push(PendingOp::Unregister(id));
            return;
        }
        match (which, key) {
            (IndexKind::Identifier, KeyRef::Name(k)) => {
                if let Some(set) = self.identifier_index.get_mut(*k) {
                    set.shift_remove(&id);
                    if set.is_empty() {
                        self.identifier_index.shift_remove(*k);
                    }
                }
            }
            (IndexKind::Node, KeyRef::Kind(k)) => {
                if let Some(set) = self.node_index.get_mut(k) {
                    set.shift_remove(&id);
                    if set.is_empty() {
                        self.node_index.shift_remove(k);
                    }
                }
            }
            (IndexKind::ExternalDeclaration, KeyRef::Name(k)) => {
                if let Some(set) = self.external_declaration_index.get_mut(*k) {
                    set.shift_remove(&id);
                    if set.is_empty() {
                        self.external_declaration_index.shift_remove(*k);
                    }
                }
            }
            _ => unreachable!("index/key kind mismatch"),
        }
    }

    /// Renames an Identifier's index entry: unregisters under
    /// `old`, registers under `new`.
    pub(crate) fn rename_identifier(&mut self, id: NodeId, old: &str, new: &str) {
        self.remove_from(IndexKind::Identifier, &KeyRef::Name(old), id);
        self.insert_into(IndexKind::Identifier, new.to_string(), id);
    }
}

fn kind_key(kind: SyntaxKind) -> SyntaxKind {
    kind
}

enum MapKey {
    Name(String),
    Kind(SyntaxKind),
}
impl From<String> for MapKey {
    fn from(v: String) -> Self {
        MapKey::Name(v)
    }
}
impl From<SyntaxKind> for MapKey {
    fn from(v: SyntaxKind) -> Self {
        MapKey::Kind(v)
    }
}
enum KeyRef<'a> {
    Name(&'a str),
    Kind(SyntaxKind),
}

#[derive(Clone, Copy)]
enum IndexKind {
    Identifier,
    Node,
    ExternalDeclaration,
}

/// A read view into one of a [`Root`]'s three indices, keyed by `K`.
pub struct Index<'r, K> {
    root: &'r Root,
    key: IndexKind,
    _marker: std::marker::PhantomData<K>,
}

impl Index<'_, String> {
    /// All nodes currently indexed under `name`.
    pub fn get(&self, name: &str) -> Vec<NodeId> {
        self.root.with_inner(|inner| {
            let map = match self.key {
                IndexKind::Identifier => &inner.identifier_index,
                IndexKind::ExternalDeclaration => &inner.external_declaration_index,
                IndexKind::Node => unreachable!(),
            };
            map.get(name)
                .map(|s| s.iter().copied().collect())
                .unwrap_or_default()
        })
    }

    /// An arbitrary match under `name`; fails if there are zero.
    pub fn get_one(&self, name: &str) -> Result<NodeId> {
        self.get(name)
            .into_iter()
            .next()
            .ok_or_else(|| Error::UniquenessViolation(format!("no entry for '{name}'")))
    }

    /// The sole match under `name`; fails if there are zero or more than one.
    pub fn get_unique(&self, name: &str) -> Result<NodeId> {
        let mut matches = self.get(name);
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(Error::UniquenessViolation(format!("no entry for '{name}'"))),
            n => Err(Error::UniquenessViolation(format!(
                "expected exactly one entry for '{name}', found {n}"
            ))),
        }
    }

    /// All names with at least one entry.
    pub fn keys(&self) -> Vec<String> {
        self.root.with_inner(|inner| {
            let map = match self.key {
                IndexKind::Identifier => &inner.identifier_index,
                IndexKind::ExternalDeclaration => &inner.external_declaration_index,
                IndexKind::Node => unreachable!(),
            };
            map.keys().cloned().collect()
        })
    }
}

impl Index<'_, SyntaxKind> {
    /// All nodes currently indexed under `kind`.
    pub fn get(&self, kind: SyntaxKind) -> Vec<NodeId> {
        self.root.with_inner(|inner| {
            inner
                .node_index
                .get(&kind)
                .map(|s| s.iter().copied().collect())
                .unwrap_or_default()
        })
    }

    /// An arbitrary match of `kind`; fails if there are zero.
    pub fn get_one(&self, kind: SyntaxKind) -> Result<NodeId> {
        self.get(kind)
            .into_iter()
            .next()
            .ok_or_else(|| Error::UniquenessViolation(format!("no node of kind {kind:?}")))
    }

    /// The sole match of `kind`; fails if there are zero or more than one.
    pub fn get_unique(&self, kind: SyntaxKind) -> Result<NodeId> {
        let mut matches = self.get(kind);
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(Error::UniquenessViolation(format!("no node of kind {kind:?}"))),
            n => Err(Error::UniquenessViolation(format!(
                "expected exactly one node of kind {kind:?}, found {n}"
            ))),
        }
    }
}

/// Whether `kind` is one of the external-declaration shapes that should be
/// keyed by the name(s) it declares.
fn is_external_declaration(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::TypeAndInitDeclaration
            | SyntaxKind::InterfaceBlockDeclaration
            | SyntaxKind::FunctionDefinition
            | SyntaxKind::FunctionPrototype
            | SyntaxKind::PrecisionDeclaration
    )
}

/// The name(s) an external declaration contributes to the
/// external-declaration index: every member name for a type-and-init
/// declaration, the instance/block name for an interface block, and the
/// function name for a definition/prototype.
fn external_declaration_names(arena: &Arena, id: NodeId) -> Vec<String> {
    let data = arena.get(id);
    let mut names = Vec::new();
    match data.kind {
        SyntaxKind::TypeAndInitDeclaration => {
            for child in data.child_nodes() {
                let member = arena.get(child);
                if member.kind == SyntaxKind::DeclarationMember {
                    if let Some(Child::Token(tok)) =
                        member.children.iter().find(|c| matches!(c, Child::Token(t) if t.kind == SyntaxKind::Ident))
                    {
                        names.push(tok.text.clone());
                    }
                }
            }
        }
        SyntaxKind::InterfaceBlockDeclaration | SyntaxKind::FunctionDefinition | SyntaxKind::FunctionPrototype => {
            for child in &data.children {
                if let Child::Token(tok) = child {
                    if tok.kind == SyntaxKind::Ident {
                        names.push(tok.text.clone());
                        break;
                    }
                }
            }
        }
        _ => {}
    }
    names
}
