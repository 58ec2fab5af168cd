use core::{borrow::Borrow, hash::Hash};
use hashbrown::HashMap;
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

struct Counted<C, V> {
	count: C,
	value: V,
}

/// A map whose entries count how often they were acquired.
///
/// Releasing only decrements. Entries at zero stay in place (and can be re-acquired) until [`RcHashMap::collect`],
/// so values that are still in use elsewhere (like a running JavaScript closure) aren't dropped early.
pub struct RcHashMap<K, C, V> {
	entries: HashMap<K, Counted<C, V>>,
}
impl<K, C, V> Default for RcHashMap<K, C, V> {
	fn default() -> Self {
		Self { entries: HashMap::new() }
	}
}
impl<K: Hash + Eq, C: CheckedAdd + CheckedSub + One + Zero, V> RcHashMap<K, C, V> {
	/// Counts one more reference to `key`, creating its value with `make` if it isn't present.
	pub fn acquire_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> Result<&V, CountSaturatedError> {
		let entry = self.entries.entry(key).or_insert_with(|| Counted {
			count: C::zero(),
			value: make(),
		});
		entry.count = entry.count.checked_add(&C::one()).ok_or(CountSaturatedError)?;
		Ok(&entry.value)
	}

	/// Counts one reference to `key` less. [`Ok(None)`] iff there's no such entry.
	pub fn release<Q: ?Sized + Hash + Eq>(&mut self, key: &Q) -> Result<Option<&V>, CountSaturatedError>
	where
		K: Borrow<Q>,
	{
		let entry = match self.entries.get_mut(key) {
			Some(entry) => entry,
			None => return Ok(None),
		};
		entry.count = entry.count.checked_sub(&C::one()).ok_or(CountSaturatedError)?;
		Ok(Some(&entry.value))
	}

	/// Drops all entries with a count of zero, returning how many there were.
	pub fn collect(&mut self) -> usize {
		self.entries.drain_filter(|_, entry| entry.count.is_zero()).count()
	}

	/// How many entries are currently acquired at least once.
	pub fn live_len(&self) -> usize {
		self.entries.values().filter(|entry| !entry.count.is_zero()).count()
	}
}

/// The count would over- or underflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountSaturatedError;
