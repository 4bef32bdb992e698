use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::Cell;
use core::cmp::Ordering;
use core::fmt;
use core::fmt::Debug;
use core::mem;
use core::ptr;

use crate::policy::DefaultHashPolicy;
use crate::policy::HashPolicy;

/// Smallest slot vector the table will allocate.
const MIN_SIZE: usize = 2;

/// One slot of the table.
///
/// `Tombstone` is a real variant rather than a sentinel value so that a
/// vacated slot can never be confused with a never-used one. The distinction
/// matters for probing: an Empty slot terminates a probe sequence, a
/// Tombstone does not.
enum Slot<V> {
    Empty,
    Tombstone,
    Occupied(V),
}

impl<V: Clone> Clone for Slot<V> {
    fn clone(&self) -> Self {
        match self {
            Slot::Empty => Slot::Empty,
            Slot::Tombstone => Slot::Tombstone,
            Slot::Occupied(item) => Slot::Occupied(item.clone()),
        }
    }
}

/// A reference to a single table slot, as returned by
/// [`Table::find_slot`].
///
/// A `SlotRef` is an index into the table's current slot vector. It stays
/// valid only until the next mutating call on the same table: any operation
/// that can rebuild the vector ([`Table::insert`]/[`Table::insert_at`] when
/// they trigger a rehash, [`Table::clear`], [`Table::reset`],
/// [`Table::drain`]) invalidates every previously issued `SlotRef`. Using a
/// stale reference is not unsafe, but it addresses an arbitrary slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRef {
    index: usize,
}

/// A hash table using open addressing with double hashing.
///
/// The table size is always a power of two. The secondary (increment) hash
/// is forced to an odd value, making it relatively prime to the table size,
/// which guarantees the probe sequence can reach every slot during collision
/// resolution. Deleted slots become tombstones that later insertions reclaim.
///
/// Items are opaque; hashing and equality come from the policy `P` (see
/// [`HashPolicy`]). An item acts as its own lookup key.
///
/// The table is single-threaded by design: there is no internal
/// synchronization, and the diagnostic counters use plain [`Cell`]s.
///
/// # Examples
///
/// ```rust
/// use dblhash::Table;
///
/// let mut table: Table<&str> = Table::with_size(16);
/// table.insert("alpha");
/// table.insert("beta");
///
/// assert_eq!(table.find(&"alpha"), Some(&"alpha"));
/// assert_eq!(table.remove(&"beta"), Some("beta"));
/// assert_eq!(table.find(&"beta"), None);
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Clone)]
pub struct Table<V, P = DefaultHashPolicy> {
    slots: Box<[Slot<V>]>,
    capacity: usize,
    fill: usize,
    empty_slots: usize,
    lookups: Cell<u64>,
    collisions: Cell<u64>,
    rehashes: u64,
    policy: P,
}

impl<V, P> Debug for Table<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("fill", &self.fill)
            .field("size", &self.slots.len())
            .field("capacity", &self.capacity)
            .field("empty_slots", &self.empty_slots)
            .field("lookups", &self.lookups.get())
            .field("collisions", &self.collisions.get())
            .field("rehashes", &self.rehashes)
            .finish()
    }
}

impl<V, P> Table<V, P>
where
    P: HashPolicy<V> + Default,
{
    /// Creates a minimal table with the default policy.
    pub fn new() -> Self {
        Self::with_policy(P::default())
    }

    /// Creates a table with the default policy and at least `requested`
    /// slots.
    ///
    /// The size is rounded up to the next power of two, minimum 2.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dblhash::Table;
    ///
    /// let table: Table<u64> = Table::with_size(10);
    /// assert_eq!(table.size(), 16);
    ///
    /// let table: Table<u64> = Table::with_size(17);
    /// assert_eq!(table.size(), 32);
    /// ```
    pub fn with_size(requested: usize) -> Self {
        Self::with_size_and_policy(requested, P::default())
    }
}

impl<V, P> Default for Table<V, P>
where
    P: HashPolicy<V> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, P> Table<V, P> {
    /// Creates a minimal table with the given policy.
    pub fn with_policy(policy: P) -> Self {
        Self::with_size_and_policy(MIN_SIZE, policy)
    }

    /// Creates a table with the given policy and at least `requested` slots,
    /// rounded up to the next power of two (minimum 2).
    ///
    /// The growth threshold is set to 15/16 of the size, a 93.75% load
    /// factor.
    pub fn with_size_and_policy(requested: usize, policy: P) -> Self {
        let size = requested.next_power_of_two().max(MIN_SIZE);
        Self {
            slots: vacant_slots(size),
            capacity: size * 15 / 16,
            fill: 0,
            empty_slots: size,
            lookups: Cell::new(0),
            collisions: Cell::new(0),
            rehashes: 0,
            policy,
        }
    }

    /// Returns the number of items in the table.
    pub fn len(&self) -> usize {
        self.fill
    }

    /// Returns `true` if the table contains no items.
    pub fn is_empty(&self) -> bool {
        self.fill == 0
    }

    /// Returns the current size of the slot vector. Always a power of two.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Returns the growth threshold: the number of items the table holds
    /// before an insertion doubles it.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of genuinely empty slots, not counting tombstones.
    pub fn empty_slots(&self) -> usize {
        self.empty_slots
    }

    /// Returns a reference to the table's policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Returns an iterator over every item, in slot-vector order.
    ///
    /// The order is an implementation detail, not a guaranteed logical
    /// order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dblhash::Table;
    ///
    /// let mut table: Table<u64> = Table::with_size(8);
    /// table.load([3, 1, 2]);
    ///
    /// let mut seen: Vec<u64> = table.iter().copied().collect();
    /// seen.sort_unstable();
    /// assert_eq!(seen, [1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.slots.iter(),
            remaining: self.fill,
        }
    }

    /// Removes and returns every item, leaving the table empty.
    ///
    /// This is the way to take items back out of the table wholesale; the
    /// table keeps its size and its probe statistics. All outstanding
    /// [`SlotRef`]s are invalidated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dblhash::Table;
    ///
    /// let mut table: Table<u64> = Table::with_size(8);
    /// table.load([1, 2, 3]);
    ///
    /// let items: Vec<u64> = table.drain().collect();
    /// assert_eq!(items.len(), 3);
    /// assert!(table.is_empty());
    /// ```
    pub fn drain(&mut self) -> Drain<V> {
        let size = self.slots.len();
        let old = mem::replace(&mut self.slots, vacant_slots(size));
        self.fill = 0;
        self.empty_slots = size;
        Drain {
            inner: Vec::from(old).into_iter(),
        }
    }

    /// Drops every item and resets all slots to empty.
    ///
    /// The size and the probe statistics are retained.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.fill = 0;
        self.empty_slots = self.slots.len();
    }

    /// Like [`clear`](Table::clear), but also zeroes every diagnostic
    /// counter. Items still inside are dropped; call
    /// [`drain`](Table::drain) first to keep them.
    pub fn reset(&mut self) {
        self.clear();
        self.lookups.set(0);
        self.collisions.set(0);
        self.rehashes = 0;
    }

    /// Collects a reference to every item into a fresh vector, in
    /// slot-vector order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dblhash::Table;
    ///
    /// let mut table: Table<u64> = Table::with_size(8);
    /// table.load([3, 1, 2]);
    /// assert_eq!(table.dump().len(), 3);
    /// ```
    pub fn dump(&self) -> Vec<&V> {
        let mut items = Vec::new();
        self.dump_into(&mut items);
        items
    }

    /// Collects a reference to every item into a caller-provided buffer,
    /// replacing its previous contents.
    pub fn dump_into<'a>(&'a self, buffer: &mut Vec<&'a V>) {
        buffer.clear();
        buffer.reserve(self.fill);
        buffer.extend(self.iter());
    }

    /// Collects a reference to every item and sorts them with the given
    /// comparator. This is the only operation that imposes an order on
    /// the table's contents.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dblhash::Table;
    ///
    /// let mut table: Table<u64> = Table::with_size(8);
    /// table.load([3, 1, 2]);
    ///
    /// let sorted = table.dump_sorted(|a, b| a.cmp(b));
    /// assert_eq!(sorted, [&1, &2, &3]);
    /// ```
    pub fn dump_sorted(&self, mut compare: impl FnMut(&V, &V) -> Ordering) -> Vec<&V> {
        let mut items = self.dump();
        items.sort_unstable_by(|a, b| compare(a, b));
        items
    }

    /// Removes the item in the given slot, if any, leaving a tombstone.
    ///
    /// Empty and tombstoned slots are left untouched and yield `None`.
    pub fn remove_at(&mut self, slot: SlotRef) -> Option<V> {
        let slot = &mut self.slots[slot.index];
        match mem::replace(slot, Slot::Tombstone) {
            Slot::Occupied(item) => {
                self.fill -= 1;
                Some(item)
            }
            vacant => {
                *slot = vacant;
                None
            }
        }
    }

    /// Returns a snapshot of the table's diagnostic statistics.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dblhash::Table;
    ///
    /// let mut table: Table<u64> = Table::with_size(16);
    /// table.load(0..8);
    ///
    /// let stats = table.stats();
    /// assert_eq!(stats.fill, 8);
    /// assert_eq!(stats.size, 16);
    /// println!("{stats}");
    /// ```
    pub fn stats(&self) -> TableStats {
        TableStats {
            fill: self.fill,
            size: self.slots.len(),
            rehashes: self.rehashes,
            collisions: self.collisions.get(),
            lookups: self.lookups.get(),
        }
    }
}

impl<V, P> Table<V, P>
where
    P: HashPolicy<V>,
{
    /// Returns the slot holding `key`, or the slot where `key` would be
    /// inserted.
    ///
    /// When the key is absent and the probe walked over a tombstone, the
    /// first such tombstone is returned rather than the terminating empty
    /// slot, so that insertion reclaims vacated slots immediately.
    ///
    /// Every call counts as one lookup; each occupied, non-matching slot
    /// examined counts as one collision. The returned [`SlotRef`] obeys the
    /// invalidation contract documented on that type.
    pub fn find_slot(&self, key: &V) -> SlotRef {
        SlotRef {
            index: self.probe(&self.slots, key),
        }
    }

    /// Returns the item equal to `key`, if present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dblhash::Table;
    ///
    /// let mut table: Table<u64> = Table::with_size(8);
    /// table.insert(7);
    /// assert_eq!(table.find(&7), Some(&7));
    /// assert_eq!(table.find(&8), None);
    /// ```
    pub fn find(&self, key: &V) -> Option<&V> {
        match &self.slots[self.find_slot(key).index] {
            Slot::Occupied(item) => Some(item),
            _ => None,
        }
    }

    /// Returns a mutable reference to the item equal to `key`, if present.
    ///
    /// The caller must not mutate the item in a way that changes its hashes
    /// or its equality class, or it becomes unreachable by probing.
    pub fn find_mut(&mut self, key: &V) -> Option<&mut V> {
        let index = self.find_slot(key).index;
        match &mut self.slots[index] {
            Slot::Occupied(item) => Some(item),
            _ => None,
        }
    }

    /// Inserts `item`, returning the previously stored equal item, if any.
    ///
    /// Insertion cannot fail for lack of room: when the free-slot margin is
    /// exhausted the table rebuilds itself first, doubling if the live fill
    /// has reached the growth threshold.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dblhash::Table;
    ///
    /// let mut table: Table<&str> = Table::with_size(8);
    /// assert_eq!(table.insert("token"), None);
    /// assert_eq!(table.insert("token"), Some("token"));
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn insert(&mut self, item: V) -> Option<V> {
        let slot = self.find_slot(&item);
        let (_, previous) = self.insert_at(item, slot);
        previous
    }

    /// Stores `item` into a slot previously obtained from
    /// [`find_slot`](Table::find_slot) for this item (or an equal key),
    /// skipping the second probe an [`insert`](Table::insert) would cost.
    ///
    /// Returns the slot now holding the item together with whatever equal
    /// item the slot held before. When the store exhausts the free-slot
    /// margin, the table is rebuilt and the returned slot is freshly
    /// recomputed; the slot passed in (like all others) is invalidated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dblhash::Table;
    ///
    /// let mut table: Table<u64> = Table::with_size(8);
    /// let slot = table.find_slot(&7);
    /// let (slot, previous) = table.insert_at(7, slot);
    /// assert_eq!(previous, None);
    /// assert_eq!(table.remove_at(slot), Some(7));
    /// ```
    pub fn insert_at(&mut self, item: V, slot: SlotRef) -> (SlotRef, Option<V>) {
        let previous = match mem::replace(&mut self.slots[slot.index], Slot::Occupied(item)) {
            Slot::Occupied(previous) => Some(previous),
            Slot::Empty => {
                self.fill += 1;
                self.empty_slots -= 1;
                None
            }
            Slot::Tombstone => {
                self.fill += 1;
                None
            }
        };

        if self.empty_slots < self.slots.len() - self.capacity {
            let index = self.rehash(slot.index);
            (SlotRef { index }, previous)
        } else {
            (slot, previous)
        }
    }

    /// Removes and returns the item equal to `key`, if present.
    ///
    /// Removing an absent key is a no-op returning `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dblhash::Table;
    ///
    /// let mut table: Table<u64> = Table::with_size(8);
    /// table.insert(7);
    /// assert_eq!(table.remove(&7), Some(7));
    /// assert_eq!(table.remove(&7), None);
    /// ```
    pub fn remove(&mut self, key: &V) -> Option<V> {
        let slot = self.find_slot(key);
        self.remove_at(slot)
    }

    /// Inserts every item yielded by `items`, equivalent to repeated
    /// [`insert`](Table::insert) calls. Items displaced by equal later
    /// items are dropped.
    pub fn load<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = V>,
    {
        for item in items {
            self.insert(item);
        }
    }

    /// Walks the double-hashing probe sequence for `key` over `slots`.
    ///
    /// Returns the index of the slot holding a matching item, or the index
    /// where the key would be stored: the first tombstone passed over if
    /// any, otherwise the terminating empty slot. The secondary hash is
    /// computed at most once, and only after a collision with a different
    /// item; forcing it odd keeps the stride coprime to the power-of-two
    /// size, so the sequence visits every slot before repeating.
    /// Termination is guaranteed because the growth margin keeps at least
    /// one slot empty.
    ///
    /// `slots` is a parameter rather than `&self.slots` so rehash can probe
    /// the replacement vector while the table still owns it.
    fn probe(&self, slots: &[Slot<V>], key: &V) -> usize {
        self.lookups.set(self.lookups.get() + 1);

        let mask = slots.len() - 1;
        let mut pos = self.policy.hash_primary(key) as usize;
        let mut stride = 0usize;
        let mut tombstone = None;

        loop {
            let index = pos & mask;
            match &slots[index] {
                Slot::Empty => return tombstone.unwrap_or(index),
                Slot::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Slot::Occupied(existing) => {
                    if ptr::eq(key, existing) || self.policy.equals(key, existing) {
                        return index;
                    }
                    self.collisions.set(self.collisions.get() + 1);
                }
            }

            if stride == 0 {
                stride = self.policy.hash_secondary(key) as usize | 1;
            }
            pos = pos.wrapping_add(stride);
        }
    }

    /// Rebuilds the slot vector, reinserting every live item and discarding
    /// tombstones.
    ///
    /// Doubles the size only if the live fill has reached the growth
    /// threshold; otherwise the rebuild compacts tombstones at the same
    /// size, which is the path taken when delete/insert churn rather than
    /// growth exhausted the empty-slot margin.
    ///
    /// `watch` is the index of the just-stored item in the old vector;
    /// its index in the new vector is returned, since every old index is
    /// stale the moment the vector is replaced.
    fn rehash(&mut self, watch: usize) -> usize {
        let new_size = if self.fill >= self.capacity {
            self.slots.len() * 2
        } else {
            self.slots.len()
        };
        self.capacity = new_size * 15 / 16;
        self.rehashes += 1;

        let old = mem::replace(&mut self.slots, vacant_slots(new_size));
        let mut watched = watch;
        for (old_index, slot) in Vec::from(old).into_iter().enumerate() {
            if let Slot::Occupied(item) = slot {
                let index = self.probe(&self.slots, &item);
                if old_index == watch {
                    watched = index;
                }
                self.slots[index] = Slot::Occupied(item);
            }
        }
        self.empty_slots = new_size - self.fill;
        watched
    }
}

impl<V, P> Extend<V> for Table<V, P>
where
    P: HashPolicy<V>,
{
    fn extend<I: IntoIterator<Item = V>>(&mut self, items: I) {
        self.load(items);
    }
}

fn vacant_slots<V>(size: usize) -> Box<[Slot<V>]> {
    core::iter::repeat_with(|| Slot::Empty).take(size).collect()
}

/// An iterator over the items of a [`Table`], in slot-vector order.
pub struct Iter<'a, V> {
    inner: core::slice::Iter<'a, Slot<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Slot::Occupied(item) => {
                    self.remaining -= 1;
                    return Some(item);
                }
                _ => continue,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// A draining iterator over the items of a [`Table`].
///
/// The table is already empty by the time this iterator exists; dropping it
/// drops any items not yet yielded.
pub struct Drain<V> {
    inner: alloc::vec::IntoIter<Slot<V>>,
}

impl<V> Iterator for Drain<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Slot::Occupied(item) => return Some(item),
                _ => continue,
            }
        }
    }
}

/// A consuming iterator over the items of a [`Table`].
pub struct IntoIter<V> {
    inner: alloc::vec::IntoIter<Slot<V>>,
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Slot::Occupied(item) => return Some(item),
                _ => continue,
            }
        }
    }
}

impl<V, P> IntoIterator for Table<V, P> {
    type Item = V;
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: Vec::from(self.slots).into_iter(),
        }
    }
}

impl<'a, V, P> IntoIterator for &'a Table<V, P> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A snapshot of a table's diagnostic counters, as returned by
/// [`Table::stats`].
///
/// The [`Display`](fmt::Display) form is the classic one-line report:
/// `Load=8/16=50%, Rehash=0, Collisions=0/8=0%`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableStats {
    /// Number of live items.
    pub fill: usize,
    /// Size of the slot vector.
    pub size: usize,
    /// Number of times the slot vector was rebuilt.
    pub rehashes: u64,
    /// Number of occupied, non-matching slots examined while probing.
    pub collisions: u64,
    /// Number of probe sequences walked.
    pub lookups: u64,
}

impl TableStats {
    /// Ratio of live items to slots.
    pub fn load_factor(&self) -> f64 {
        self.fill as f64 / self.size as f64
    }

    /// Ratio of collisions to lookups; 0 when no lookup has happened yet.
    pub fn collision_ratio(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.collisions as f64 / self.lookups as f64
        }
    }
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Load={}/{}={:.0}%, Rehash={}, Collisions={}/{}={:.0}%",
            self.fill,
            self.size,
            100.0 * self.load_factor(),
            self.rehashes,
            self.collisions,
            self.lookups,
            100.0 * self.collision_ratio(),
        )
    }
}
