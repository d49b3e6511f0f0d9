//! Label element types and old-to-new value mappings

use std::fmt::Debug;
use std::hash::Hash;

/// Integral element type usable as a label.
///
/// Labels live in the `u64` domain during merging; negative values have no
/// label and are rejected.
pub trait LabelValue: Copy + Ord + Hash + Debug + Send + Sync + 'static {
    /// The value as a label, or `None` if it is negative.
    fn to_label(self) -> Option<u64>;

    /// Convert a label back into the element type, or `None` on overflow.
    fn from_label(label: u64) -> Option<Self>;

    fn is_background(self) -> bool {
        self.to_label() == Some(0)
    }
}

macro_rules! impl_label_value {
    ($($t:ty),*) => {
        $(
            impl LabelValue for $t {
                #[inline]
                fn to_label(self) -> Option<u64> {
                    u64::try_from(self).ok()
                }

                #[inline]
                fn from_label(label: u64) -> Option<Self> {
                    <$t>::try_from(label).ok()
                }
            }
        )*
    };
}

impl_label_value!(u8, u16, u32, u64, usize, i8, i16, i32, i64);

/// Keys-unique association from old to new values, sorted by old value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping<K, V> {
    entries: Vec<(K, V)>,
}

impl<K: Ord + Copy, V: Copy> Mapping<K, V> {
    /// Build a mapping from entries already sorted by strictly increasing key.
    pub(crate) fn from_sorted(entries: Vec<(K, V)>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, key: K) -> Option<V> {
        self.entries
            .binary_search_by(|(k, _)| k.cmp(&key))
            .ok()
            .map(|pos| self.entries[pos].1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, V)> + '_ {
        self.entries.iter().copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    /// The sub-mapping covering `keys`, which must be sorted and present.
    ///
    /// Used to hand each block a lookup table holding only its own values.
    #[must_use]
    pub fn restrict(&self, keys: &[K]) -> Self {
        let entries = keys
            .iter()
            .filter_map(|&k| self.get(k).map(|v| (k, v)))
            .collect();
        Self { entries }
    }
}

impl<K, V> IntoIterator for Mapping<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
