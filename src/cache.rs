//! Memoization cache for the apply family
//!
//! A bounded associative store from `(operator, operands, aux)` to result
//! node ids. The cache is semantically transparent: every operation computes
//! the same node id whether or not its key is present. It is cleared
//! wholesale when it outgrows its capacity and after every GC sweep, since
//! entries may refer to swept nodes and are themselves never GC roots.

use rustc_hash::FxHashMap;

use crate::factory::apply::BinOp;
use crate::node::NodeId;

/// Quantifier selector for the quantification cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum QuantOp {
    Exist,
    ForAll,
    Unique,
}

impl QuantOp {
    /// The operator that combines the two cofactor results: ∨ for ∃,
    /// ∧ for ∀, ⊕ for the unique quantifier.
    pub(crate) fn combiner(self) -> BinOp {
        match self {
            QuantOp::Exist => BinOp::Or,
            QuantOp::ForAll => BinOp::And,
            QuantOp::Unique => BinOp::Xor,
        }
    }
}

/// Operator tag of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CacheOp {
    Not,
    Apply(BinOp),
    Ite,
    Quant(QuantOp),
    ApplyQuant(BinOp, QuantOp),
    Restrict,
    Constrain,
    Simplify,
    Compose,
    VecCompose,
    Replace,
}

/// Full cache key: tag plus up to three operand ids plus an auxiliary word
/// (VarSet cube id, pairing generation, or composition level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    pub op: CacheOp,
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
    pub aux: u64,
}

impl CacheKey {
    pub(crate) fn unary(op: CacheOp, a: NodeId) -> Self {
        CacheKey {
            op,
            a,
            b: 0,
            c: 0,
            aux: 0,
        }
    }

    pub(crate) fn binary(op: CacheOp, a: NodeId, b: NodeId) -> Self {
        CacheKey {
            op,
            a,
            b,
            c: 0,
            aux: 0,
        }
    }

    pub(crate) fn ternary(op: CacheOp, a: NodeId, b: NodeId, c: NodeId) -> Self {
        CacheKey { op, a, b, c, aux: 0 }
    }

    pub(crate) fn with_aux(mut self, aux: u64) -> Self {
        self.aux = aux;
        self
    }
}

/// Hit/miss counters, exposed through the factory for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that missed.
    pub misses: u64,
    /// Entries currently stored.
    pub entries: usize,
}

/// The bounded operator cache.
#[derive(Debug)]
pub(crate) struct OpCache {
    map: FxHashMap<CacheKey, NodeId>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl OpCache {
    pub(crate) fn new(capacity: usize) -> Self {
        OpCache {
            map: FxHashMap::default(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub(crate) fn lookup(&mut self, key: &CacheKey) -> Option<NodeId> {
        match self.map.get(key) {
            Some(&id) => {
                self.hits += 1;
                Some(id)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub(crate) fn insert(&mut self, key: CacheKey, value: NodeId) {
        if self.map.len() >= self.capacity {
            self.map.clear();
        }
        self.map.insert(key, value);
    }

    /// Drop every entry. Called after each GC sweep.
    pub(crate) fn clear(&mut self) {
        self.map.clear();
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.map.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_miss_then_hit() {
        let mut cache = OpCache::new(8);
        let key = CacheKey::binary(CacheOp::Apply(BinOp::And), 2, 3);
        assert_eq!(cache.lookup(&key), None);
        cache.insert(key, 7);
        assert_eq!(cache.lookup(&key), Some(7));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn aux_distinguishes_entries() {
        let mut cache = OpCache::new(8);
        let base = CacheKey::unary(CacheOp::VecCompose, 5);
        cache.insert(base.with_aux(1), 10);
        cache.insert(base.with_aux(2), 11);
        assert_eq!(cache.lookup(&base.with_aux(1)), Some(10));
        assert_eq!(cache.lookup(&base.with_aux(2)), Some(11));
    }

    #[test]
    fn overflow_evicts_everything() {
        let mut cache = OpCache::new(2);
        cache.insert(CacheKey::unary(CacheOp::Not, 2), 3);
        cache.insert(CacheKey::unary(CacheOp::Not, 3), 2);
        cache.insert(CacheKey::unary(CacheOp::Not, 4), 5);
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(cache.lookup(&CacheKey::unary(CacheOp::Not, 4)), Some(5));
    }
}
