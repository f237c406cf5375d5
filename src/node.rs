//! Node representation for the shared diagram store
//!
//! Nodes live in a flat arena indexed by [`NodeId`]. The two terminal nodes
//! occupy the first two slots and are never freed; every other slot holds a
//! branch `(level, low, high)` or is free for reuse after a sweep.

/// Node identifier: an index into the factory's node arena.
pub type NodeId = usize;

/// Variable identifier (stable index assigned at creation).
pub type Var = usize;

/// Level: a position in the current variable ordering (0 is outermost).
pub type Level = usize;

/// Terminal node for FALSE (the empty family in ZDD mode).
pub const ZERO_NODE: NodeId = 0;

/// Terminal node for TRUE (the `{{}}` family in ZDD mode).
pub const ONE_NODE: NodeId = 1;

/// Sentinel level reported for terminals, below every real level.
///
/// Keeping terminals "deeper than everything" lets the apply engines take
/// `min` over operand levels without special cases.
pub const TERMINAL_LEVEL: Level = usize::MAX;

/// Reduction rule selector, fixed when a factory is created.
///
/// The flag keys the reduction applied by `mk`, the polarity of variables
/// absent from a path, the meaning of the universe, and don't-care detection
/// during enumeration. It cannot change once any branch node exists, which
/// this crate enforces by never exposing a way to change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramKind {
    /// Reduced ordered BDD: branches with `low == high` collapse.
    Bdd,
    /// Zero-suppressed DD: branches with `high == zero` collapse.
    Zdd,
}

/// One slot of the node arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Terminal node (always at indices 0 and 1).
    Terminal(bool),
    /// Branch node: `if var-at-level then high else low`.
    Branch {
        level: Level,
        low: NodeId,
        high: NodeId,
        /// External reference count. Nonzero makes this node a GC root.
        refs: u32,
        /// Scratch bit for mark-and-sweep.
        mark: bool,
    },
    /// Swept slot awaiting reuse through the free list.
    Free,
}

impl Slot {
    /// Level of the node in this slot; terminals report [`TERMINAL_LEVEL`].
    pub(crate) fn level(&self) -> Level {
        match self {
            Slot::Terminal(_) => TERMINAL_LEVEL,
            Slot::Branch { level, .. } => *level,
            Slot::Free => unreachable!("free slot reached through a live id"),
        }
    }
}
