//! Memoized structural hashing
//!
//! Nodes are immutable, so a structural hash computed once stays valid for
//! the node's lifetime. [`HashMemo`] stores it in a once-cell: whether the
//! hash was computed is tracked by the cell itself, never by a sentinel value
//! (a real hash may be zero). Two threads hashing the same node for the first
//! time may both compute it; the value is deterministic so the race is benign
//! and only one result is stored.

use once_cell::sync::OnceCell;
use rustc_hash::FxHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone, Default)]
pub struct HashMemo(OnceCell<u64>);

impl HashMemo {
    pub fn new() -> Self {
        Self(OnceCell::new())
    }

    /// Return the cached hash, computing it with `feed` on first use
    pub fn get_or_compute(&self, feed: impl FnOnce(&mut FxHasher)) -> u64 {
        *self.0.get_or_init(|| {
            let mut hasher = FxHasher::default();
            feed(&mut hasher);
            hasher.finish()
        })
    }

    pub fn is_computed(&self) -> bool {
        self.0.get().is_some()
    }
}

// The memo is derived state: it never takes part in equality or hashing.
impl PartialEq for HashMemo {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for HashMemo {}

impl Hash for HashMemo {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

impl fmt::Debug for HashMemo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashMemo")
    }
}

/// Implement `Hash` and `hash_code()` for a node from its declared fields.
///
/// Fields are listed in declaration order, inherited ones first, matching the
/// derived `PartialEq` so that equal nodes always hash equally.
macro_rules! memoized_hash {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $ty {
            /// Structural hash, computed once and cached
            pub fn hash_code(&self) -> u64 {
                self.hash_memo.get_or_compute(|hasher| {
                    $( ::std::hash::Hash::hash(&self.$field, hasher); )*
                })
            }
        }

        impl ::std::hash::Hash for $ty {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                state.write_u64(self.hash_code());
            }
        }
    };
}

pub(crate) use memoized_hash;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_computes_once() {
        let memo = HashMemo::new();
        assert!(!memo.is_computed());

        let mut calls = 0;
        let first = memo.get_or_compute(|h| {
            calls += 1;
            42u32.hash(h);
        });
        let second = memo.get_or_compute(|_| panic!("recomputed a cached hash"));

        assert_eq!(calls, 1);
        assert_eq!(first, second);
        assert!(memo.is_computed());
    }

    #[test]
    fn test_memo_is_invisible_to_equality() {
        let computed = HashMemo::new();
        computed.get_or_compute(|h| 7u8.hash(h));
        assert_eq!(computed, HashMemo::new());
    }
}
