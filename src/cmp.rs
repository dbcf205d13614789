//! Key ordering for the maps.
//!
//! A map carries a comparator value implementing [`Compare`]; [`Natural`]
//! delegates to [`Ord`] and is the default. Custom orders either implement
//! [`Compare`] directly or wrap a closure in [`FnCmp`].

use core::borrow::Borrow;
use core::cmp::Ordering;

/// A total order over keys, with an optional borrowed lookup type.
///
/// `Q` is the type lookups are performed with; it defaults to the stored key
/// type `K`.
pub trait Compare<Q: ?Sized, K: ?Sized = Q> {
    fn compare(&self, lhs: &Q, rhs: &K) -> Ordering;
}

/// The natural order of keys via [`Ord`].
///
/// Supports lookups by any borrowed form of the key, like the standard
/// library maps: a map keyed by `String` can be queried with `&str`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Natural;

impl<Q, K> Compare<Q, K> for Natural
where
    Q: Ord + ?Sized,
    K: Borrow<Q> + ?Sized,
{
    fn compare(&self, lhs: &Q, rhs: &K) -> Ordering {
        lhs.cmp(rhs.borrow())
    }
}

/// A comparison closure used as a map order.
#[derive(Copy, Clone, Debug, Default)]
pub struct FnCmp<F>(pub F);

impl<K, F> Compare<K> for FnCmp<F>
where
    F: Fn(&K, &K) -> Ordering,
{
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        (self.0)(lhs, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_borrowed_lookup() {
        let cmp = Natural;
        let owned = String::from("b");
        assert_eq!(Compare::<str, String>::compare(&cmp, "a", &owned), Ordering::Less);
        assert_eq!(Compare::<str, String>::compare(&cmp, "b", &owned), Ordering::Equal);
    }

    #[test]
    fn fn_cmp_reverses() {
        let cmp = FnCmp(|a: &u32, b: &u32| b.cmp(a));
        assert_eq!(cmp.compare(&1, &2), Ordering::Greater);
    }
}
