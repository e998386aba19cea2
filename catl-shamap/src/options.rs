//! Tree-wide configuration. Resolves the Open Question of §9 in
//! `SPEC_FULL.md`: rather than three independently-settable hash-impl
//! flags, a single [`CollapseMode`] picks both the tree-shape behavior
//! (whether inners with one inner child collapse) and the matching hasher.

/// Whether, and how, single-child inners are collapsed ("skip nodes").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum CollapseMode {
    /// No collapsing; every inner occupies exactly one depth level.
    #[default]
    None,
    /// Only a single *leaf* child hoists into its parent (the classic
    /// "inner with exactly one leaf child disappears" rule used by
    /// `collapse_path`).
    LeafsOnly,
    /// Leaves *and* inner chains collapse: an inner with exactly one child
    /// that is itself an inner is replaced by that child, producing a skip
    /// from the parent's depth straight to the child's. Requires the
    /// synthetic hashing chain of §4.6 to keep the root hash unchanged.
    LeafsAndInners,
}

impl CollapseMode {
    pub fn collapses_inner_chains(self) -> bool {
        matches!(self, CollapseMode::LeafsAndInners)
    }

    pub fn collapses_leafs(self) -> bool {
        matches!(self, CollapseMode::LeafsOnly | CollapseMode::LeafsAndInners)
    }
}

/// Per-tree options. `collapse` governs §3.3/§4.6; `cow_enabled` lets tests
/// build a tree with copy-on-write disabled (direct in-place mutation, no
/// path copying) to exercise the non-CoW code paths of `PathFinder`.
#[derive(Clone, Copy, Debug)]
pub struct SHAMapOptions {
    pub collapse: CollapseMode,
    pub cow_enabled: bool,
}

impl Default for SHAMapOptions {
    fn default() -> Self {
        Self {
            collapse: CollapseMode::LeafsAndInners,
            cow_enabled: true,
        }
    }
}

impl SHAMapOptions {
    pub fn new(collapse: CollapseMode) -> Self {
        Self {
            collapse,
            cow_enabled: true,
        }
    }
}
