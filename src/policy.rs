use core::hash::BuildHasher;
use core::hash::Hash;

/// Hashing and equality semantics for the items stored in a
/// [`Table`](crate::Table).
///
/// The table is deliberately ignorant of its item type: it asks the policy
/// for a primary hash to pick a starting slot, a secondary hash to derive the
/// probe stride on collision, and an equality predicate to recognize a match.
/// Both hashes must be deterministic for a given item. The engine forces the
/// secondary hash odd itself, so implementations need not bother.
///
/// A lookup key is simply an item reference; an item always acts as its own
/// key.
pub trait HashPolicy<V: ?Sized> {
    /// Primary hash, selects the starting slot of the probe sequence.
    fn hash_primary(&self, item: &V) -> u64;

    /// Secondary hash, determines the probe stride once a collision occurs.
    ///
    /// Only computed lazily by the engine, after the first collision with a
    /// different item. It should be independent of [`hash_primary`]: if the
    /// two are correlated, colliding items also share probe sequences and
    /// collision chains get longer than necessary.
    ///
    /// [`hash_primary`]: HashPolicy::hash_primary
    fn hash_secondary(&self, item: &V) -> u64;

    /// Returns `true` if the two items are logically equal.
    fn equals(&self, a: &V, b: &V) -> bool;
}

/// A [`HashPolicy`] built from two independent [`BuildHasher`]s, with
/// equality from [`Eq`].
///
/// The two builders should produce uncorrelated hash functions; with seeded
/// hashers, two different seeds are enough.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "foldhash")] {
/// use dblhash::HasherPolicy;
/// use dblhash::Table;
/// use foldhash::fast::FixedState;
///
/// let policy = HasherPolicy::new(FixedState::with_seed(1), FixedState::with_seed(2));
/// let mut table = Table::with_size_and_policy(32, policy);
/// table.insert("interned");
/// assert!(table.find(&"interned").is_some());
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct HasherPolicy<S1, S2> {
    primary: S1,
    secondary: S2,
}

impl<S1, S2> HasherPolicy<S1, S2> {
    /// Creates a policy from a primary and a secondary hash builder.
    pub fn new(primary: S1, secondary: S2) -> Self {
        Self { primary, secondary }
    }
}

impl<V, S1, S2> HashPolicy<V> for HasherPolicy<S1, S2>
where
    V: Hash + Eq,
    S1: BuildHasher,
    S2: BuildHasher,
{
    fn hash_primary(&self, item: &V) -> u64 {
        self.primary.hash_one(item)
    }

    fn hash_secondary(&self, item: &V) -> u64 {
        self.secondary.hash_one(item)
    }

    fn equals(&self, a: &V, b: &V) -> bool {
        a == b
    }
}

/// The policy used when none is specified: foldhash with two fixed,
/// distinct seeds.
#[cfg(feature = "foldhash")]
pub type DefaultHashPolicy =
    HasherPolicy<foldhash::fast::FixedState, foldhash::fast::FixedState>;

/// Placeholder for the default policy type parameter when the `foldhash`
/// feature is disabled. Uninhabited; construct tables with an explicit
/// policy instead.
#[cfg(not(feature = "foldhash"))]
#[derive(Clone, Debug)]
pub enum DefaultHashPolicy {}

#[cfg(feature = "foldhash")]
impl Default for DefaultHashPolicy {
    fn default() -> Self {
        Self::new(
            foldhash::fast::FixedState::with_seed(0x51ab_9a4b_38f8_2a5d),
            foldhash::fast::FixedState::with_seed(0xc90f_daa2_2168_c234),
        )
    }
}

/// A [`HashPolicy`] assembled from plain function pointers, mirroring the
/// classic table-of-function-pointers construction.
///
/// Handy when the hash functions are rigged rather than derived from the
/// item, e.g. to force collisions in tests or to hash a single field.
///
/// # Examples
///
/// ```rust
/// use dblhash::FnPolicy;
/// use dblhash::Table;
///
/// let policy: FnPolicy<u64> = FnPolicy {
///     hash_primary: |&v| v,
///     hash_secondary: |&v| v >> 32,
///     equals: |a, b| a == b,
/// };
/// let mut table = Table::with_size_and_policy(64, policy);
/// table.insert(7u64);
/// assert!(table.find(&7).is_some());
/// ```
pub struct FnPolicy<V> {
    /// Primary hash function.
    pub hash_primary: fn(&V) -> u64,
    /// Secondary hash function.
    pub hash_secondary: fn(&V) -> u64,
    /// Equality predicate.
    pub equals: fn(&V, &V) -> bool,
}

impl<V> Clone for FnPolicy<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for FnPolicy<V> {}

impl<V> HashPolicy<V> for FnPolicy<V> {
    fn hash_primary(&self, item: &V) -> u64 {
        (self.hash_primary)(item)
    }

    fn hash_secondary(&self, item: &V) -> u64 {
        (self.hash_secondary)(item)
    }

    fn equals(&self, a: &V, b: &V) -> bool {
        (self.equals)(a, b)
    }
}

#[cfg(all(test, feature = "foldhash"))]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_deterministic() {
        let policy = DefaultHashPolicy::default();
        assert_eq!(policy.hash_primary(&42u64), policy.hash_primary(&42u64));
        assert_eq!(policy.hash_secondary(&42u64), policy.hash_secondary(&42u64));
        assert!(policy.equals(&42u64, &42u64));
        assert!(!policy.equals(&42u64, &43u64));
    }

    #[test]
    fn primary_and_secondary_differ() {
        let policy = DefaultHashPolicy::default();
        // Seeded differently, so the two functions should disagree on
        // essentially every input.
        assert_ne!(policy.hash_primary(&42u64), policy.hash_secondary(&42u64));
    }
}
