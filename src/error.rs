//! Error types for the decision-diagram library
//!
//! Errors are organized by source: each concern (node store, inspectors,
//! finite domains, pairings, iterators) has its own enum with specific
//! variants, and the top-level [`BddError`] combines them for APIs that can
//! fail for more than one reason.
//!
//! Two error kinds from the original system are deliberately absent because
//! they are unrepresentable here: use-after-consumption (the `…_with`
//! operations take handles by value, so the borrow checker rejects reuse) and
//! mode violations (the BDD/ZDD flag is fixed when a factory is created).

use std::fmt;

use num_bigint::BigUint;

/// Errors raised by the node store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The node arena reached its configured cap and cannot grow further.
    ///
    /// This is fatal for the operation but leaves the factory consistent;
    /// further allocation will fail the same way until nodes are freed.
    TableFull {
        /// The configured maximum number of arena slots.
        limit: usize,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::TableFull { limit } => write!(
                f,
                "Node table reached its cap of {} slots. Free handles and run gc(), \
                 or raise FactoryConfig::max_nodes.",
                limit
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors raised by handle inspectors and cross-handle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// A branch-only inspector was called on a terminal node.
    TerminalNode {
        /// The inspector that was called (`"var"`, `"low"`, `"high"`, …).
        operation: &'static str,
    },
    /// Two handles from different factories were combined.
    MismatchedFactories,
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::TerminalNode { operation } => {
                write!(f, "Cannot apply '{}' to a terminal node", operation)
            }
            NodeError::MismatchedFactories => {
                write!(f, "Operands belong to different factories")
            }
        }
    }
}

impl std::error::Error for NodeError {}

/// Errors raised by variable and finite-domain arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A variable index outside the factory's current ordering.
    UnknownVariable {
        /// The offending variable index.
        var: usize,
        /// The number of variables currently declared.
        var_num: usize,
    },
    /// A domain index outside the factory's domain table.
    UnknownDomain {
        /// The offending domain index.
        index: usize,
        /// The number of domains currently declared.
        count: usize,
    },
    /// A finite-domain value outside `[0, range)`.
    ValueOutOfRange {
        /// The offending value.
        value: BigUint,
        /// The exclusive upper bound of the domain.
        range: BigUint,
    },
    /// A finite domain was requested with an empty range.
    EmptyRange,
    /// An interval with `lo > hi` was requested.
    InvalidRange { lo: BigUint, hi: BigUint },
    /// Two domains of different bit widths were combined.
    SizeMismatch {
        /// Bit width of the left domain.
        left: usize,
        /// Bit width of the right domain.
        right: usize,
    },
    /// `ensure_capacity` asked for more bits than the domain allocated.
    BitsExceedDomain {
        /// Bits needed for the requested range.
        requested: usize,
        /// Bits allocated when the domain was created.
        allocated: usize,
    },
    /// An argument that must be a cube (conjunction of literals) was not one.
    NotACube,
    /// The variable ordering cannot shrink once declared.
    CannotShrinkVarNum { current: usize, requested: usize },
    /// A count restriction set does not cover the function's support.
    SupportNotCovered {
        /// A variable in the support that is missing from the set.
        var: usize,
    },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::UnknownVariable { var, var_num } => write!(
                f,
                "Unknown variable {} (factory has {} variables)",
                var, var_num
            ),
            DomainError::UnknownDomain { index, count } => {
                write!(f, "Unknown domain {} (factory has {} domains)", index, count)
            }
            DomainError::ValueOutOfRange { value, range } => {
                write!(f, "Value {} outside the domain range [0, {})", value, range)
            }
            DomainError::EmptyRange => write!(f, "Domain range must be at least 1"),
            DomainError::InvalidRange { lo, hi } => {
                write!(f, "Invalid interval: lo {} exceeds hi {}", lo, hi)
            }
            DomainError::SizeMismatch { left, right } => {
                write!(f, "Domain bit widths differ ({} vs {} bits)", left, right)
            }
            DomainError::BitsExceedDomain {
                requested,
                allocated,
            } => write!(
                f,
                "Range needs {} bits but the domain allocated {}",
                requested, allocated
            ),
            DomainError::NotACube => {
                write!(f, "Argument is not a cube (conjunction of literals)")
            }
            DomainError::CannotShrinkVarNum { current, requested } => write!(
                f,
                "Cannot shrink the variable count from {} to {}",
                current, requested
            ),
            DomainError::SupportNotCovered { var } => write!(
                f,
                "Variable {} is in the support but not in the restriction set",
                var
            ),
        }
    }
}

impl std::error::Error for DomainError {}

/// Errors raised by pairing misuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingError {
    /// `replace` requires variable-to-variable pairings only.
    NotVariablePairing {
        /// The variable whose replacement is a full diagram.
        var: usize,
    },
}

impl fmt::Display for PairingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingError::NotVariablePairing { var } => write!(
                f,
                "Pairing maps variable {} to a diagram; replace() accepts only \
                 variable-to-variable pairings (use veccompose() instead)",
                var
            ),
        }
    }
}

impl std::error::Error for PairingError {}

/// Errors raised by satisfying-assignment iterators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IteratorError {
    /// `remove` was called before the first `next`.
    RemoveBeforeNext,
    /// `fast_forward` targeted a position that is not a don't-care.
    NotDontCare {
        /// The variable that was targeted.
        var: usize,
    },
}

impl fmt::Display for IteratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IteratorError::RemoveBeforeNext => {
                write!(f, "remove() called before the first minterm was produced")
            }
            IteratorError::NotDontCare { var } => write!(
                f,
                "Variable {} is not a don't-care in the current assignment",
                var
            ),
        }
    }
}

impl std::error::Error for IteratorError {}

/// Combined error type returned by factory and handle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BddError {
    /// Node store error (resource exhaustion).
    Store(StoreError),
    /// Handle misuse (terminal inspectors, mismatched factories).
    Node(NodeError),
    /// Argument or finite-domain error.
    Domain(DomainError),
    /// Pairing misuse.
    Pairing(PairingError),
    /// Iterator misuse.
    Iterator(IteratorError),
}

impl fmt::Display for BddError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BddError::Store(e) => write!(f, "{}", e),
            BddError::Node(e) => write!(f, "{}", e),
            BddError::Domain(e) => write!(f, "{}", e),
            BddError::Pairing(e) => write!(f, "{}", e),
            BddError::Iterator(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BddError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BddError::Store(e) => Some(e),
            BddError::Node(e) => Some(e),
            BddError::Domain(e) => Some(e),
            BddError::Pairing(e) => Some(e),
            BddError::Iterator(e) => Some(e),
        }
    }
}

impl From<StoreError> for BddError {
    fn from(err: StoreError) -> Self {
        BddError::Store(err)
    }
}

impl From<NodeError> for BddError {
    fn from(err: NodeError) -> Self {
        BddError::Node(err)
    }
}

impl From<DomainError> for BddError {
    fn from(err: DomainError) -> Self {
        BddError::Domain(err)
    }
}

impl From<PairingError> for BddError {
    fn from(err: PairingError) -> Self {
        BddError::Pairing(err)
    }
}

impl From<IteratorError> for BddError {
    fn from(err: IteratorError) -> Self {
        BddError::Iterator(err)
    }
}
