//! Hash-consed node store with reference counting and mark-and-sweep
//!
//! The store owns the flat node arena and the unique table that guarantees
//! structural sharing: no two live branches carry the same `(level, low,
//! high)` triple. Allocation reuses swept slots before growing the arena, and
//! an optional node cap turns exhaustion into an error instead of unbounded
//! growth.
//!
//! # NodeId stability
//!
//! A `NodeId` stays valid while the node is reachable from a root (a handle,
//! a VarSet cube, or a permanently pinned variable node). Swept ids are
//! recycled, which is safe because the operator cache is cleared on every
//! sweep and no other component retains ids of unpinned nodes across a
//! collection.

use rustc_hash::FxHashMap;

use crate::error::StoreError;
use crate::node::{DiagramKind, Level, NodeId, Slot, ONE_NODE, ZERO_NODE};

/// Arena, unique table and free list for one factory.
#[derive(Debug)]
pub(crate) struct NodeTable {
    kind: DiagramKind,
    slots: Vec<Slot>,
    unique: FxHashMap<(Level, NodeId, NodeId), NodeId>,
    free: Vec<NodeId>,
    /// Hard cap on arena slots; `usize::MAX` means unbounded.
    max_nodes: usize,
}

impl NodeTable {
    pub(crate) fn new(kind: DiagramKind, initial_capacity: usize, max_nodes: usize) -> Self {
        let mut slots = Vec::with_capacity(initial_capacity.max(2));
        slots.push(Slot::Terminal(false));
        slots.push(Slot::Terminal(true));
        NodeTable {
            kind,
            slots,
            unique: FxHashMap::default(),
            free: Vec::new(),
            max_nodes,
        }
    }

    pub(crate) fn kind(&self) -> DiagramKind {
        self.kind
    }

    /// Look up or create the branch `(level, low, high)`.
    ///
    /// Applies the mode reduction first: in BDD mode a branch with equal
    /// children collapses to the child, in ZDD mode a branch whose high edge
    /// is the zero terminal collapses to its low child.
    pub(crate) fn mk(
        &mut self,
        level: Level,
        low: NodeId,
        high: NodeId,
    ) -> Result<NodeId, StoreError> {
        match self.kind {
            DiagramKind::Bdd => {
                if low == high {
                    return Ok(low);
                }
            }
            DiagramKind::Zdd => {
                if high == ZERO_NODE {
                    return Ok(low);
                }
            }
        }
        debug_assert!(self.level(low) > level && self.level(high) > level);

        let key = (level, low, high);
        if let Some(&id) = self.unique.get(&key) {
            return Ok(id);
        }

        let id = if let Some(id) = self.free.pop() {
            self.slots[id] = Slot::Branch {
                level,
                low,
                high,
                refs: 0,
                mark: false,
            };
            id
        } else {
            if self.slots.len() >= self.max_nodes {
                return Err(StoreError::TableFull {
                    limit: self.max_nodes,
                });
            }
            let id = self.slots.len();
            self.slots.push(Slot::Branch {
                level,
                low,
                high,
                refs: 0,
                mark: false,
            });
            id
        };
        self.unique.insert(key, id);
        Ok(id)
    }

    /// Level of a node; terminals report [`TERMINAL_LEVEL`].
    pub(crate) fn level(&self, id: NodeId) -> Level {
        self.slots[id].level()
    }

    pub(crate) fn is_terminal(&self, id: NodeId) -> bool {
        id == ZERO_NODE || id == ONE_NODE
    }

    /// Low child of a branch. Must not be called on terminals.
    pub(crate) fn low(&self, id: NodeId) -> NodeId {
        match &self.slots[id] {
            Slot::Branch { low, .. } => *low,
            _ => unreachable!("low() on a terminal or free slot"),
        }
    }

    /// High child of a branch. Must not be called on terminals.
    pub(crate) fn high(&self, id: NodeId) -> NodeId {
        match &self.slots[id] {
            Slot::Branch { high, .. } => *high,
            _ => unreachable!("high() on a terminal or free slot"),
        }
    }

    /// Cofactors of `id` with respect to the variable at `level`.
    ///
    /// When the node sits below `level` the variable is absent from it: in
    /// BDD mode both cofactors are the node itself, in ZDD mode the high
    /// cofactor is the zero terminal (an elided node means "false when set").
    pub(crate) fn cofactors(&self, id: NodeId, level: Level) -> (NodeId, NodeId) {
        if self.level(id) == level {
            (self.low(id), self.high(id))
        } else {
            match self.kind {
                DiagramKind::Bdd => (id, id),
                DiagramKind::Zdd => (id, ZERO_NODE),
            }
        }
    }

    /// Add one external reference. Terminals ignore reference counting.
    pub(crate) fn incref(&mut self, id: NodeId) {
        if let Slot::Branch { refs, .. } = &mut self.slots[id] {
            *refs += 1;
        }
    }

    /// Drop one external reference. Terminals ignore reference counting.
    pub(crate) fn decref(&mut self, id: NodeId) {
        if let Slot::Branch { refs, .. } = &mut self.slots[id] {
            debug_assert!(*refs > 0, "reference count underflow on node {id}");
            *refs = refs.saturating_sub(1);
        }
    }

    /// Mark every node reachable from a branch with a nonzero external
    /// reference count, sweep the rest, and rebuild the unique table.
    ///
    /// Returns the number of slots freed. The caller is responsible for
    /// clearing the operator cache afterwards; swept ids may be recycled.
    pub(crate) fn gc(&mut self) -> usize {
        // Mark phase: external references are the only roots.
        let mut work: Vec<NodeId> = Vec::new();
        for (id, slot) in self.slots.iter().enumerate() {
            if let Slot::Branch { refs, .. } = slot {
                if *refs > 0 {
                    work.push(id);
                }
            }
        }
        while let Some(id) = work.pop() {
            let (low, high) = match &mut self.slots[id] {
                Slot::Branch {
                    low, high, mark, ..
                } => {
                    if *mark {
                        continue;
                    }
                    *mark = true;
                    (*low, *high)
                }
                _ => continue,
            };
            if low > ONE_NODE {
                work.push(low);
            }
            if high > ONE_NODE {
                work.push(high);
            }
        }

        // Sweep phase.
        let mut freed = 0;
        for id in 2..self.slots.len() {
            let dead = match &mut self.slots[id] {
                Slot::Branch { mark, .. } => {
                    if *mark {
                        *mark = false;
                        false
                    } else {
                        true
                    }
                }
                _ => false,
            };
            if dead {
                self.slots[id] = Slot::Free;
                self.free.push(id);
                freed += 1;
            }
        }
        let slots = &self.slots;
        self.unique
            .retain(|_, id| matches!(slots[*id], Slot::Branch { .. }));
        freed
    }

    /// Total arena slots, including terminals and free slots.
    pub(crate) fn arena_size(&self) -> usize {
        self.slots.len()
    }

    /// Number of live branch nodes plus the two terminals.
    pub(crate) fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| !matches!(s, Slot::Free))
            .count()
    }

    pub(crate) fn free_count(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TERMINAL_LEVEL;

    fn table(kind: DiagramKind) -> NodeTable {
        NodeTable::new(kind, 16, usize::MAX)
    }

    #[test]
    fn terminals_are_preallocated() {
        let t = table(DiagramKind::Bdd);
        assert_eq!(t.level(ZERO_NODE), TERMINAL_LEVEL);
        assert_eq!(t.level(ONE_NODE), TERMINAL_LEVEL);
        assert_eq!(t.live_count(), 2);
    }

    #[test]
    fn bdd_reduction_collapses_equal_children() {
        let mut t = table(DiagramKind::Bdd);
        let n = t.mk(0, ONE_NODE, ONE_NODE).unwrap();
        assert_eq!(n, ONE_NODE);
    }

    #[test]
    fn zdd_reduction_collapses_zero_high() {
        let mut t = table(DiagramKind::Zdd);
        let n = t.mk(0, ONE_NODE, ZERO_NODE).unwrap();
        assert_eq!(n, ONE_NODE);
        // Equal children do not collapse in ZDD mode.
        let n = t.mk(0, ONE_NODE, ONE_NODE).unwrap();
        assert_ne!(n, ONE_NODE);
    }

    #[test]
    fn hash_consing_returns_same_id() {
        let mut t = table(DiagramKind::Bdd);
        let a = t.mk(1, ZERO_NODE, ONE_NODE).unwrap();
        let b = t.mk(1, ZERO_NODE, ONE_NODE).unwrap();
        assert_eq!(a, b);
        let c = t.mk(0, ZERO_NODE, a).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn node_cap_reports_exhaustion() {
        let mut t = NodeTable::new(DiagramKind::Bdd, 2, 3);
        t.mk(1, ZERO_NODE, ONE_NODE).unwrap();
        let err = t.mk(0, ZERO_NODE, ONE_NODE).unwrap_err();
        assert!(matches!(err, StoreError::TableFull { limit: 3 }));
        // The store stays consistent and re-fails.
        assert!(t.mk(0, ONE_NODE, ZERO_NODE).is_err());
    }

    #[test]
    fn gc_sweeps_unreferenced_nodes() {
        let mut t = table(DiagramKind::Bdd);
        let kept = t.mk(1, ZERO_NODE, ONE_NODE).unwrap();
        let inner = t.mk(2, ONE_NODE, ZERO_NODE).unwrap();
        let dead = t.mk(0, inner, ONE_NODE).unwrap();
        t.incref(kept);

        let freed = t.gc();
        assert_eq!(freed, 2);
        assert_eq!(t.live_count(), 3);

        // Swept triples can be re-created; the swept ids are reused.
        let again = t.mk(2, ONE_NODE, ZERO_NODE).unwrap();
        assert!(again == inner || again == dead);
    }

    #[test]
    fn gc_keeps_interior_nodes_of_referenced_roots() {
        let mut t = table(DiagramKind::Bdd);
        let inner = t.mk(2, ZERO_NODE, ONE_NODE).unwrap();
        let root = t.mk(0, inner, ONE_NODE).unwrap();
        t.incref(root);
        assert_eq!(t.gc(), 0);
        assert_eq!(t.level(inner), 2);

        t.decref(root);
        assert_eq!(t.gc(), 2);
        assert_eq!(t.live_count(), 2);
    }
}
