//! Walks a single key down from the root, then (on request) rewrites the
//! visited inner nodes under copy-on-write and/or collapses any ancestor
//! left with a single child. `SHAMap`'s mutating operations are all thin
//! wrappers around a `PathFinder`.

use crate::node::Node;
use crate::options::CollapseMode;
use catl_types::key::find_divergence;
use catl_types::{Error, Key256, Result};

/// What the walk found at the end of the path.
enum Terminal {
    /// Reached an inner node with no child at the relevant branch.
    Empty,
    /// Reached a leaf. `bool` is whether its key equals the search key.
    Leaf(Node, bool),
}

pub struct PathFinder<'a> {
    root: &'a mut Node,
    key: Key256,
    /// Inner nodes visited, root-to-deepest.
    inners: Vec<Node>,
    /// `branches[i]` is the branch taken out of `inners[i]`, leading either
    /// to `inners[i + 1]` or to the terminal.
    branches: Vec<u8>,
    terminal: Terminal,
}

impl<'a> PathFinder<'a> {
    pub fn new(root: &'a mut Node, key: Key256) -> Result<Self> {
        let mut inners = Vec::new();
        let mut branches = Vec::new();
        let mut current = root.clone();
        let terminal = loop {
            match &current {
                Node::Leaf(leaf) => {
                    let matches = leaf.item.key == key;
                    break Terminal::Leaf(current.clone(), matches);
                }
                Node::Inner(inner) => {
                    let branch = key.nibble(inner.depth() as u16)?;
                    match inner.child(branch) {
                        Some(child) => {
                            inners.push(current.clone());
                            branches.push(branch);
                            current = child;
                        }
                        None => {
                            inners.push(current.clone());
                            branches.push(branch);
                            break Terminal::Empty;
                        }
                    }
                }
            }
        };
        Ok(Self {
            root,
            key,
            inners,
            branches,
            terminal,
        })
    }

    pub fn found_leaf(&self) -> Option<&Node> {
        match &self.terminal {
            Terminal::Leaf(node, _) => Some(node),
            Terminal::Empty => None,
        }
    }

    pub fn leaf_matches(&self) -> bool {
        matches!(self.terminal, Terminal::Leaf(_, true))
    }

    pub fn is_empty_slot(&self) -> bool {
        matches!(self.terminal, Terminal::Empty)
    }

    /// The inner node at the end of the walked path (always present: the
    /// root itself counts if the tree is otherwise empty).
    pub fn last_inner(&self) -> &Node {
        self.inners.last().expect("PathFinder always visits the root")
    }

    pub fn last_branch(&self) -> u8 {
        *self.branches.last().expect("PathFinder always visits the root")
    }

    pub fn last_depth(&self) -> u8 {
        match self.last_inner() {
            Node::Inner(i) => i.depth(),
            Node::Leaf(_) => unreachable!("`inners` only ever holds inner nodes"),
        }
    }

    /// First nibble depth at which the search key diverges from a
    /// previously-found non-matching leaf's key. Only meaningful when a
    /// mismatched leaf was found.
    pub fn divergence_depth(&self) -> Result<u16> {
        match &self.terminal {
            Terminal::Leaf(node, false) => {
                let existing = node.as_leaf().expect("leaf terminal").item.key;
                find_divergence(&existing, &self.key, (self.last_depth() as u16) + 1)
            }
            _ => Err(Error::NullNode("no divergent leaf at path terminal")),
        }
    }

    /// Rewrites every visited inner node that doesn't already belong to
    /// `target_version`, splicing the freshly copied nodes back into their
    /// parents (and into `*self.root`, if the root itself was copied).
    /// Must run before installing any new terminal node.
    pub fn dirty_or_copy_inners(&mut self, target_version: u64) {
        let mut child_override: Option<Node> = None;
        for i in (0..self.inners.len()).rev() {
            let original = match &self.inners[i] {
                Node::Inner(a) => a.clone(),
                Node::Leaf(_) => unreachable!("`inners` only ever holds inner nodes"),
            };
            let branch = self.branches[i];
            let node = if original.needs_copy(target_version) {
                Node::Inner(std::sync::Arc::new(original.copy_with_version(target_version)))
            } else {
                self.inners[i].clone()
            };
            if let (Node::Inner(arc), Some(child)) = (&node, child_override.take()) {
                arc.set_child(branch, child);
            }
            self.inners[i] = node.clone();
            child_override = Some(node);
        }
        if let Some(new_root) = child_override {
            *self.root = new_root;
        }
    }

    /// Installs `node` at the terminal branch of the (already dirtied) last
    /// inner node.
    pub fn set_terminal(&self, node: Node) {
        if let Node::Inner(inner) = self.last_inner() {
            inner.set_child(self.last_branch(), node);
        }
    }

    /// Removes whatever occupies the terminal branch.
    pub fn remove_terminal(&self) {
        if let Node::Inner(inner) = self.last_inner() {
            inner.remove_child(self.last_branch());
        }
    }

    /// Walking from the deepest visited ancestor back to (but not
    /// including) the root, splices out any inner left with exactly one
    /// child, so the tree never physically carries a single-child chain —
    /// only the `hashing` module's synthetic reconstruction sees one.
    pub fn collapse_path(&self, mode: CollapseMode) {
        for i in (1..self.inners.len()).rev() {
            let inner = match &self.inners[i] {
                Node::Inner(a) => a.clone(),
                Node::Leaf(_) => unreachable!(),
            };
            let Some((_, only_child)) = inner.only_child() else {
                continue;
            };
            let allowed = match &only_child {
                Node::Leaf(_) => mode.collapses_leafs(),
                Node::Inner(_) => mode.collapses_inner_chains(),
            };
            if !allowed {
                continue;
            }
            let parent = match &self.inners[i - 1] {
                Node::Inner(a) => a.clone(),
                Node::Leaf(_) => unreachable!(),
            };
            parent.set_child(self.branches[i - 1], only_child);
        }
    }
}

#[cfg(test)]
mod pathfinder_test;
