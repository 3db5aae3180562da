//! Provide [`HashMap`] based on [hashbrown]'s implementation.

use crate::hash::FixedHashState;

/// A [`hashbrown::HashMap`] with [`FixedHashState`] as the default hashing provider.
///
/// Iteration order only depends on the inserted keys, which keeps
/// registry dumps and test output reproducible across runs.
///
/// # Examples
///
/// ```
/// use vc_utils::hash::HashMap;
///
/// let mut map: HashMap<&str, u32> = HashMap::default();
/// map.insert("a", 1);
///
/// assert_eq!(map.get("a"), Some(&1));
/// ```
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

/// Re-export of [`hashbrown::hash_map::Entry`].
pub use hashbrown::hash_map::Entry;
