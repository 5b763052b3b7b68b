//! The generic node handle and the low-level tree-surgery operations every
//! typed AST wrapper is built from.

use glsl_grammar::SyntaxKind;

use crate::arena::Child;
use crate::arena::LeafToken;
use crate::arena::NodeData;
use crate::arena::NodeId;
use crate::error::Error;
use crate::error::Result;
use crate::root::Root;

/// A live handle into a [`Root`]'s arena: an arena index plus the root it
/// belongs to, so every operation can reach the indices and siblings it
/// needs without threading extra arguments through every call site.
#[derive(Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) root: Root,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.root.0.as_ptr() == other.root.0.as_ptr()
    }
}
impl Eq for Node {}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node").field("id", &self.id).field("kind", &self.kind()).finish()
    }
}

impl Node {
    /// Wraps a raw arena id with the root it lives in. Callers outside this
    /// crate reach nodes only through typed wrappers, never this
    /// constructor directly.
    pub(crate) fn new(id: NodeId, root: Root) -> Self {
        Node { id, root }
    }

    /// This node's underlying arena id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The [`Root`] this node belongs to.
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// This node's kind.
    pub fn kind(&self) -> SyntaxKind {
        self.root.with_inner(|inner| inner.arena.get(self.id).kind)
    }

    /// This node's leaf text, if it carries any (e.g. an `Identifier`'s
    /// current spelling).
    pub fn text(&self) -> Option<String> {
        self.root.with_inner(|inner| inner.arena.get(self.id).text.clone())
    }

    /// This node's parent, if attached.
    pub fn parent(&self) -> Option<Node> {
        self.root.with_inner(|inner| inner.arena.get(self.id).parent).map(|id| Node::new(id, self.root.clone()))
    }

    /// This node's structural children, in source order.
    pub fn children(&self) -> Vec<Node> {
        self.root.with_inner(|inner| inner.arena.get(self.id).child_nodes().collect::<Vec<_>>())
            .into_iter()
            .map(|id| Node::new(id, self.root.clone()))
            .collect()
    }

    /// This node's direct children, interleaving structural nodes and every
    /// leaf token (default- and hidden-channel alike), in the exact order
    /// they were parsed. Used only by [`crate::printer`], which is the one
    /// consumer that needs hidden trivia back.
    pub(crate) fn raw_children(&self) -> Vec<RawChild> {
        self.root.with_inner(|inner| {
            inner
                .arena
                .get(self.id)
                .children
                .iter()
                .map(|c| match c {
                    Child::Node(id) => RawChild::Node(Node::new(*id, self.root.clone())),
                    Child::Token(tok) => RawChild::Token(tok.clone()),
                })
                .collect()
        })
    }

    /// This node's leaf-token children on the default (non-hidden) channel,
    /// in source order.
    pub fn tokens(&self) -> Vec<LeafToken> {
        self.root.with_inner(|inner| {
            inner
                .arena
                .get(self.id)
                .children
                .iter()
                .filter_map(|c| match c {
                    Child::Token(tok) if !tok.is_hidden() => Some(tok.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    /// The text of this node's first leaf-token child of `kind`, if any.
    pub fn first_token_text(&self, kind: SyntaxKind) -> Option<String> {
        self.tokens().into_iter().find(|t| t.kind == kind).map(|t| t.text)
    }

    /// The first structural child of this node whose kind is `kind`.
    pub fn first_child_of_kind(&self, kind: SyntaxKind) -> Option<Node> {
        self.children().into_iter().find(|c| c.kind() == kind)
    }

    /// The first structural child that casts to `T`.
    pub fn first_child_as<T: AstNode>(&self) -> Option<T> {
        self.children().into_iter().find_map(T::cast)
    }

    /// All structural children that cast to `T`.
    pub fn children_as<T: AstNode>(&self) -> Vec<T> {
        self.children().into_iter().filter_map(T::cast).collect()
    }

    /// Walks up from this node through `parent()` until `predicate` matches
    /// a node, or the root is reached with no match.
    pub fn get_ancestor(&self, predicate: impl Fn(&Node) -> bool) -> Option<Node> {
        let mut current = self.parent();
        while let Some(node) = current {
            if predicate(&node) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// Walks up from this node looking for an ancestor of exactly `kind`.
    pub fn get_ancestor_of_kind(&self, kind: SyntaxKind) -> Option<Node> {
        self.get_ancestor(|n| n.kind() == kind)
    }

    /// Walks up from this node looking for an ancestor that casts to `T`.
    pub fn get_ancestor_as<T: AstNode>(&self) -> Option<T> {
        let mut current = self.parent();
        while let Some(node) = current {
            if let Some(cast) = T::cast(node.clone()) {
                return Some(cast);
            }
            current = node.parent();
        }
        None
    }

    /// Sets this node's `parent` back-pointer directly, without touching
    /// the parent's child list or any index. Low-level: callers are
    /// `setup`/`replace_by`/`clone_into`, which keep the child list and the
    /// back-pointer consistent together.
    pub(crate) fn set_parent(&self, parent: Option<NodeId>) {
        self.root.with_inner_mut(|inner| inner.arena.get_mut(self.id).parent = parent);
    }

    /// Clears this node's `parent` back-pointer (the inverse of
    /// `set_parent`), used when a node is spliced out of a child list but
    /// not deleted (so it can be reattached elsewhere).
    pub(crate) fn detach_parent(&self) {
        self.set_parent(None);
    }

    /// Attaches `self` as a new child of `parent`, appending it to
    /// `parent`'s child list, setting `self`'s back-pointer, and
    /// registering `self`'s subtree with every index `parent`'s root
    /// maintains.
    pub fn setup(&self, parent: &Node) {
        assert!(self.root.0.as_ptr() == parent.root.0.as_ptr(), "cannot attach a node into a different root");
        parent.root.with_inner_mut(|inner| {
            inner.arena.get_mut(parent.id).children.push(Child::Node(self.id));
        });
        self.set_parent(Some(parent.id));
        self.root.register(self.id);
    }

    /// Inserts `child` as a new structural child of `self` at structural
    /// index `index` (0-based, counting only [`Child::Node`] entries; token
    /// children such as braces and separators are skipped when locating the
    /// insertion point but left in place). `index == ` the current
    /// structural child count appends at the end. Registers `child`'s
    /// subtree afterward. Used by [`crate::phase::PhaseEnv`]'s injection
    /// points, which insert at a computed position rather than always at the
    /// tail the way `setup` does.
    pub(crate) fn insert_child_at(&self, index: usize, child: &Node) {
        assert!(self.root.0.as_ptr() == child.root.0.as_ptr(), "cannot attach a node into a different root");
        self.root.with_inner_mut(|inner| {
            let children = &mut inner.arena.get_mut(self.id).children;
            let mut seen = 0;
            let mut raw_pos = children.len();
            for (i, c) in children.iter().enumerate() {
                if matches!(c, Child::Node(_)) {
                    if seen == index {
                        raw_pos = i;
                        break;
                    }
                    seen += 1;
                }
            }
            children.insert(raw_pos, Child::Node(child.id));
        });
        child.set_parent(Some(self.id));
        self.root.register(child.id);
    }

    /// Re-parents every descendant's cached `parent` pointer to match the
    /// current child-list structure. Used after a bulk child-list splice
    /// (e.g. `replace_by` swapping one child for several) where individual
    /// `set_parent` calls would be redundant.
    pub(crate) fn update_parents(&self) {
        let children = self.children();
        for child in &children {
            child.set_parent(Some(self.id));
            child.update_parents();
        }
    }

    /// Removes `self` from its parent's child list and clears its
    /// back-pointer, without deleting it from the arena or unregistering
    /// it from indices. The node remains valid and can be reattached via
    /// `setup`.
    pub fn detach(&self) -> Result<()> {
        let parent = self.parent().ok_or_else(|| Error::DetachmentViolation("node has no parent to detach from".into()))?;
        parent.root.with_inner_mut(|inner| {
            let data = inner.arena.get_mut(parent.id);
            data.children.retain(|c| !matches!(c, Child::Node(id) if *id == self.id));
        });
        self.detach_parent();
        Ok(())
    }

    /// Replaces `self` in its parent's child list with `replacement`,
    /// re-registering the index entries for both subtrees. `self` is left
    /// detached (parent cleared) but not deleted.
    pub fn replace_by(&self, replacement: &Node) -> Result<()> {
        let parent = self.parent().ok_or_else(|| Error::DetachmentViolation("node has no parent to replace within".into()))?;
        self.root.unregister(self.id);
        parent.root.with_inner_mut(|inner| {
            let data = inner.arena.get_mut(parent.id);
            for child in &mut data.children {
                if matches!(child, Child::Node(id) if *id == self.id) {
                    *child = Child::Node(replacement.id);
                }
            }
        });
        self.detach_parent();
        replacement.set_parent(Some(parent.id));
        replacement.root.register(replacement.id);
        Ok(())
    }

    /// Like `replace_by`, but also deletes `self`'s subtree from the arena
    /// afterward. Any outstanding handle into `self`'s subtree becomes
    /// invalid.
    pub fn replace_by_and_delete(&self, replacement: &Node) -> Result<()> {
        self.replace_by(replacement)?;
        self.delete_subtree();
        Ok(())
    }

    /// Detaches `self` from its parent (if any) and deletes its entire
    /// subtree from the arena, tombstoning every node it contained.
    pub fn detach_and_delete(&self) -> Result<()> {
        if self.parent().is_some() {
            self.detach()?;
        }
        self.delete_subtree();
        Ok(())
    }

    fn delete_subtree(&self) {
        self.root.unregister(self.id);
        let ids = self.root.with_inner(|inner| collect_subtree(inner, self.id));
        self.root.with_inner_mut(|inner| {
            for id in ids {
                inner.arena.tombstone(id);
            }
        });
    }

    /// Deep-clones this node's subtree into a new, detached, unregistered
    /// node in the same root. The caller is expected to `setup` the result
    /// (or feed it through an index build session) to make it reachable.
    pub fn clone_into(&self, root: &Root) -> Node {
        let new_id = self.root.with_inner_mut(|inner| clone_recursive(inner, self.id, root));
        Node::new(new_id, root.clone())
    }
}

fn collect_subtree(inner: &crate::root::RootInner, id: NodeId) -> Vec<NodeId> {
    let mut ids = vec![id];
    for child in inner.arena.get(id).child_nodes().collect::<Vec<_>>() {
        ids.extend(collect_subtree(inner, child));
    }
    ids
}

fn clone_recursive(inner: &mut crate::root::RootInner, id: NodeId, dest: &Root) -> NodeId {
    let data = inner.arena.get(id).clone();
    let mut new_children = Vec::with_capacity(data.children.len());
    let mut child_ids = Vec::new();
    for child in &data.children {
        match child {
            Child::Node(child_id) => {
                let new_child = clone_recursive(inner, *child_id, dest);
                new_children.push(Child::Node(new_child));
                child_ids.push(new_child);
            }
            Child::Token(tok) => new_children.push(Child::Token(LeafToken {
                kind: tok.kind,
                text: tok.text.clone(),
            })),
        }
    }
    let new_id = dest.alloc(NodeData {
        kind: data.kind,
        parent: None,
        children: new_children,
        text: data.text.clone(),
    });
    for child_id in child_ids {
        dest.with_inner_mut(|dest_inner| dest_inner.arena.get_mut(child_id).parent = Some(new_id));
    }
    new_id
}

/// Builds a new, detached node in `dest` with the same kind, text, and
/// token children as `pattern`, but with each structural child replaced by
/// `transform(dest, child)` instead of a plain deep clone. Used by
/// [`crate::template::Template::instantiate`] to substitute holes that may
/// be nested several levels below the fragment's root.
pub(crate) fn clone_shell_with(
    dest: &Root,
    pattern: &Node,
    transform: &mut dyn FnMut(&Root, &Node) -> Result<Node>,
) -> Result<Node> {
    let (kind, text, children) = pattern.root.with_inner(|inner| {
        let data = inner.arena.get(pattern.id);
        (data.kind, data.text.clone(), data.children.clone())
    });
    let mut new_children = Vec::with_capacity(children.len());
    let mut child_ids = Vec::new();
    for child in &children {
        match child {
            Child::Node(child_id) => {
                let child_node = Node::new(*child_id, pattern.root.clone());
                let replacement = transform(dest, &child_node)?;
                new_children.push(Child::Node(replacement.id));
                child_ids.push(replacement.id);
            }
            Child::Token(tok) => new_children.push(Child::Token(tok.clone())),
        }
    }
    let new_id = dest.alloc(NodeData {
        kind,
        parent: None,
        children: new_children,
        text,
    });
    for child_id in child_ids {
        dest.with_inner_mut(|inner| inner.arena.get_mut(child_id).parent = Some(new_id));
    }
    Ok(Node::new(new_id, dest.clone()))
}

/// One direct child as seen by [`Node::raw_children`]: either a nested node
/// or a leaf token, hidden-channel trivia included.
pub(crate) enum RawChild {
    Node(Node),
    Token(LeafToken),
}

/// Implemented by every typed AST wrapper (`TranslationUnit`, `Expression`,
/// ...): a thin, cheaply-constructed view over a [`Node`] that checks the
/// node's kind before wrapping it.
pub trait AstNode: Sized + Clone {
    /// Whether a node of `kind` can be cast to `Self`.
    fn can_cast(kind: SyntaxKind) -> bool;

    /// Casts `node` to `Self` if its kind is accepted by `can_cast`.
    fn cast(node: Node) -> Option<Self>;

    /// The underlying generic node.
    fn syntax(&self) -> &Node;
}
