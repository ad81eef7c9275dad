use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use core::any::Any;

/// Removes `index` and moves every greater key down by one.
pub(crate) fn shift_remove<V>(map: &mut BTreeMap<usize, V>, index: usize) -> Option<V> {
    let removed = map.remove(&index);
    let tail = map.split_off(&index);
    map.extend(tail.into_iter().map(|(k, v)| (k - 1, v)));
    removed
}

/// Opens a hole at `index`, moving every key `>= index` up by one.
pub(crate) fn shift_insert<V>(map: &mut BTreeMap<usize, V>, index: usize) {
    let tail = map.split_off(&index);
    map.extend(tail.into_iter().map(|(k, v)| (k + 1, v)));
}

/// Moves the value at `from` to `to`, shifting the keys in between like a `Vec` remove+insert.
pub(crate) fn shift_move<V>(map: &mut BTreeMap<usize, V>, from: usize, to: usize) {
    if from == to {
        return;
    }
    let value = shift_remove(map, from);
    shift_insert(map, to);
    if let Some(value) = value {
        map.insert(to, value);
    }
}

/// Per-record metadata keyed by logical index.
///
/// Entries follow their record through inserts, deletes and reorders, and are independent of
/// which item view (if any) currently shows the record.
#[derive(Default)]
pub struct MetaStore {
    by_index: BTreeMap<usize, BTreeMap<&'static str, Box<dyn Any>>>,
}

impl MetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Any>(&mut self, index: usize, key: &'static str, value: T) {
        self.by_index
            .entry(index)
            .or_default()
            .insert(key, Box::new(value));
    }

    pub fn get<T: Any>(&self, index: usize, key: &'static str) -> Option<&T> {
        self.by_index.get(&index)?.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, index: usize, key: &'static str) -> Option<&mut T> {
        self.by_index.get_mut(&index)?.get_mut(key)?.downcast_mut()
    }

    pub fn remove(&mut self, index: usize, key: &'static str) -> bool {
        let Some(entries) = self.by_index.get_mut(&index) else {
            return false;
        };
        let removed = entries.remove(key).is_some();
        if entries.is_empty() {
            self.by_index.remove(&index);
        }
        removed
    }

    pub fn contains(&self, index: usize) -> bool {
        self.by_index.contains_key(&index)
    }

    pub fn clear(&mut self) {
        self.by_index.clear();
    }

    pub(crate) fn on_remove(&mut self, index: usize) {
        shift_remove(&mut self.by_index, index);
    }

    pub(crate) fn on_insert(&mut self, index: usize) {
        shift_insert(&mut self.by_index, index);
    }

    pub(crate) fn on_move(&mut self, from: usize, to: usize) {
        shift_move(&mut self.by_index, from, to);
    }
}

impl core::fmt::Debug for MetaStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MetaStore")
            .field("indexes", &self.by_index.len())
            .finish()
    }
}
