//! The node arena backing every [`crate::root::Root`].
//!
//! The AST's parent/child back-pointers form a cyclic graph, which doesn't fit
//! a tree of owned `Box`/`Rc` links without borrow-checker fights. Instead
//! nodes live in a single growable `Vec`, addressed by [`NodeId`], and
//! deletion tombstones the slot rather than shrinking the vector, so
//! outstanding `NodeId`s from a detach-and-delete reliably fail to resolve
//! instead of aliasing a reused slot.

use glsl_grammar::SyntaxKind;

/// A handle to a node in a [`crate::root::Root`]'s arena.
///
/// Stable for the lifetime of the arena slot; becomes dangling (resolves to
/// [`Slot::Tombstone`]) after [`crate::node::Node::detach_and_delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The raw arena index. Exposed for diagnostics and tests only.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// One child slot: either a structural child node or a hidden/visible leaf
/// token carried through for the printer.
#[derive(Debug, Clone)]
pub enum Child {
    /// A structural child, itself a node in this arena.
    Node(NodeId),
    /// A leaf token: operators, punctuation, keywords, and hidden trivia.
    Token(LeafToken),
}

/// A leaf token attached directly as a node's child, e.g. an operator
/// spelling or a piece of hidden whitespace/comment trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafToken {
    /// The token's kind.
    pub kind: SyntaxKind,
    /// The token's exact text.
    pub text: String,
}

impl LeafToken {
    /// Whether this token is on the hidden channel.
    pub fn is_hidden(&self) -> bool {
        self.kind.is_trivia()
    }
}

/// The data owned by one live arena slot.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// This node's kind (shared with [`glsl_grammar::SyntaxKind`] — also the
    /// node-kind index key in [`crate::root::Root`]).
    pub kind: SyntaxKind,
    /// The parent node, or `None` at the root or while detached.
    pub parent: Option<NodeId>,
    /// Ordered children: structural nodes interleaved with leaf tokens.
    pub children: Vec<Child>,
    /// Leaf-specific text, used by `Identifier` (current spelling) and by
    /// directive/literal nodes that are themselves leaves with no structural
    /// children (e.g. a `DirectiveRest`-backed pragma body).
    pub text: Option<String>,
}

impl NodeData {
    /// Iterates this node's structural (non-token) children.
    pub fn child_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().filter_map(|c| match c {
            Child::Node(id) => Some(*id),
            Child::Token(_) => None,
        })
    }
}

/// One arena slot: either a live node or a tombstone left by
/// `detach_and_delete`.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Alive(NodeData),
    Tombstone,
}

/// The arena itself: a flat `Vec` of slots.
#[derive(Debug, Default)]
pub struct Arena {
    slots: Vec<Slot>,
}

impl Arena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Arena { slots: Vec::new() }
    }

    /// Allocates a new node, returning its handle.
    pub fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot::Alive(data));
        id
    }

    /// Borrows a live node's data. Panics if `id` is tombstoned — callers are
    /// expected to hold only handles reachable from a live tree, so
    /// hitting a tombstone here is the `IndexInvariantBroken` case in
    /// practice, not a recoverable caller error.
    pub fn get(&self, id: NodeId) -> &NodeData {
        match &self.slots[id.0 as usize] {
            Slot::Alive(data) => data,
            Slot::Tombstone => panic!("use of detached-and-deleted node {id:?}"),
        }
    }

    /// Mutably borrows a live node's data.
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        match &mut self.slots[id.0 as usize] {
            Slot::Alive(data) => data,
            Slot::Tombstone => panic!("use of detached-and-deleted node {id:?}"),
        }
    }

    /// Whether `id` still resolves to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        matches!(self.slots[id.0 as usize], Slot::Alive(_))
    }

    /// Tombstones a slot. Does not touch any other node's `children`/`parent`
    /// fields — callers (`detach_and_delete`) are responsible for unlinking
    /// first.
    pub fn tombstone(&mut self, id: NodeId) {
        self.slots[id.0 as usize] = Slot::Tombstone;
    }
}
