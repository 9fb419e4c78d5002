//! First-fit-decreasing bin packing.
//!
//! Items are sorted largest first (ties keep enumeration order, so the result is
//! reproducible run to run) and each goes into the first bin with room for it.
//! An item larger than the capacity gets a bin of its own: that bin legitimately
//! exceeds the capacity and the caller is told through the `on_oversize` callback.

use crate::fs_ops::FileItem;

/// One group of items whose sizes (plus any pre-existing occupancy) fit the capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bin {
    pub items: Vec<FileItem>,
    /// `preloaded + sum(items.size)`.
    pub total_size: u64,
    /// Bytes already present before this run (non-zero only for seeded bins).
    pub preloaded: u64,
}

impl Bin {
    fn seeded(preloaded: u64) -> Self {
        Self {
            items: Vec::new(),
            total_size: preloaded,
            preloaded,
        }
    }

    fn push(&mut self, item: FileItem) {
        self.total_size += item.size;
        self.items.push(item);
    }

    /// True for the single-item bins that hold an item larger than `capacity`.
    pub fn is_oversize(&self, capacity: u64) -> bool {
        self.total_size > capacity
    }
}

/// Pack `items` into bins of at most `capacity` bytes.
pub fn pack_first_fit_decreasing(
    items: Vec<FileItem>,
    capacity: u64,
    on_oversize: impl FnMut(&FileItem),
) -> Vec<Bin> {
    pack_with_seeds(items, capacity, &[], on_oversize)
}

/// Like [`pack_first_fit_decreasing`], but the first `seeds.len()` bins start out
/// holding `seeds[i]` bytes. Seeded bins come first in the output, in seed order,
/// even if nothing new was placed in them.
pub fn pack_with_seeds(
    mut items: Vec<FileItem>,
    capacity: u64,
    seeds: &[u64],
    mut on_oversize: impl FnMut(&FileItem),
) -> Vec<Bin> {
    // Stable sort: equal sizes keep their enumeration order.
    items.sort_by(|a, b| b.size.cmp(&a.size));

    let mut bins: Vec<Bin> = seeds.iter().map(|&used| Bin::seeded(used)).collect();

    for item in items {
        if item.size > capacity {
            on_oversize(&item);
            let mut bin = Bin::default();
            bin.push(item);
            bins.push(bin);
            continue;
        }

        match bins
            .iter_mut()
            .find(|b| b.total_size.saturating_add(item.size) <= capacity)
        {
            Some(bin) => bin.push(item),
            None => {
                let mut bin = Bin::default();
                bin.push(item);
                bins.push(bin);
            }
        }
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const GB: u64 = 1024 * 1024 * 1024;

    fn item(name: &str, size: u64) -> FileItem {
        FileItem {
            name: name.into(),
            size,
            source_path: PathBuf::from("/src").join(name),
        }
    }

    fn names(bin: &Bin) -> Vec<&str> {
        bin.items.iter().map(|i| i.name.to_str().unwrap()).collect()
    }

    #[test]
    fn first_fit_decreasing_example() {
        let items = vec![item("d", GB), item("b", 3 * GB), item("a", 5 * GB), item("c", 3 * GB)];
        let bins = pack_first_fit_decreasing(items, 8 * GB, |_| panic!("no oversize expected"));

        assert_eq!(bins.len(), 2);
        assert_eq!(names(&bins[0]), ["a", "b"]);
        assert_eq!(bins[0].total_size, 8 * GB);
        assert_eq!(names(&bins[1]), ["c", "d"]);
        assert_eq!(bins[1].total_size, 4 * GB);
    }

    #[test]
    fn oversize_item_gets_own_bin_and_is_reported() {
        let mut reported = Vec::new();
        let items = vec![item("small", 2), item("huge", 50), item("mid", 7)];
        let bins = pack_first_fit_decreasing(items, 10, |i| reported.push(i.name.clone()));

        assert_eq!(reported, ["huge"]);
        assert_eq!(names(&bins[0]), ["huge"]);
        assert!(bins[0].is_oversize(10));
        assert_eq!(names(&bins[1]), ["mid", "small"]);
        assert!(!bins[1].is_oversize(10));
    }

    #[test]
    fn every_item_lands_in_exactly_one_bin_within_capacity() {
        let sizes = [9u64, 1, 4, 4, 7, 3, 3, 2, 8, 5, 6, 12, 0, 10];
        let items: Vec<_> = sizes.iter().enumerate().map(|(i, &s)| item(&format!("f{i}"), s)).collect();
        let bins = pack_first_fit_decreasing(items, 10, |_| {});

        let mut seen: Vec<String> = bins
            .iter()
            .flat_map(|b| b.items.iter().map(|i| i.name.to_string_lossy().into_owned()))
            .collect();
        seen.sort();
        let mut expected: Vec<String> = (0..sizes.len()).map(|i| format!("f{i}")).collect();
        expected.sort();
        assert_eq!(seen, expected);

        for bin in &bins {
            let sum: u64 = bin.items.iter().map(|i| i.size).sum();
            assert_eq!(bin.total_size, sum);
            assert!(bin.total_size <= 10 || bin.items.len() == 1);
        }
    }

    #[test]
    fn ties_keep_enumeration_order() {
        let items = vec![item("x", 5), item("y", 5), item("z", 5)];
        let bins = pack_first_fit_decreasing(items, 5, |_| {});
        let order: Vec<_> = bins.iter().map(|b| names(b)[0]).collect();
        assert_eq!(order, ["x", "y", "z"]);
    }

    #[test]
    fn seeded_bins_are_topped_up_first() {
        let items = vec![item("a", 4), item("b", 3), item("c", 2)];
        let bins = pack_with_seeds(items, 10, &[7, 10], |_| {});

        assert_eq!(bins.len(), 3);
        assert_eq!(names(&bins[0]), ["b"]);
        assert_eq!(bins[0].total_size, 10);
        assert_eq!(bins[0].preloaded, 7);
        assert!(bins[1].items.is_empty());
        assert_eq!(names(&bins[2]), ["a", "c"]);
    }

    #[test]
    fn empty_input_yields_no_bins() {
        assert!(pack_first_fit_decreasing(Vec::new(), 10, |_| {}).is_empty());
    }
}
