//!
//! # Ordered-Container Aliases
//!
//! The project-model file formats are all diff-sensitive to on-disk ordering,
//! so insertion-ordered maps are the base key-value container throughout.
//! [indexmap::IndexMap] provides them; this module pins the crate-wide alias
//! and the removal convention.
//!
//! Removal from an [OrderedMap] must use [indexmap::IndexMap::shift_remove],
//! which preserves the order of the remaining entries. `swap_remove` would
//! reorder a file on its next write.
//!

pub use indexmap::IndexMap;

/// Crate-wide insertion-ordered map alias.
pub type OrderedMap<K, V> = IndexMap<K, V>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_remove_preserves_order() {
        let mut map: OrderedMap<&str, usize> = OrderedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("c", 3);
        map.shift_remove("b");
        let keys: Vec<&str> = map.keys().copied().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
