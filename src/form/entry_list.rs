use indexmap::IndexMap;

use crate::codec::{self, Entry};

/// Editable list representation of one semantically keyed map.
///
/// Rows keep whatever keys the user typed, placeholder keys included;
/// [`EntryListState::build_map`] applies the codec rules (empty keys
/// dropped, last write wins) on the way back to a map.
#[derive(Debug, Clone)]
pub struct EntryListState<V> {
    entries: Vec<Entry<V>>,
    selected: usize,
    counter: usize,
}

impl<V: Clone> EntryListState<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            selected: 0,
            counter: 0,
        }
    }

    pub fn from_map(map: &IndexMap<String, V>) -> Self {
        let mut state = Self::new();
        state.seed_from_map(map);
        state
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry<V>] {
        &self.entries
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut Entry<V>> {
        self.entries.get_mut(index)
    }

    pub fn selected_index(&self) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.selected.min(self.entries.len() - 1))
        }
    }

    pub fn select(&mut self, delta: i32) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let len = self.entries.len() as i32;
        let next = (self.selected as i32 + delta).clamp(0, len - 1);
        let changed = next as usize != self.selected;
        self.selected = next as usize;
        changed
    }

    /// Append a row under a fresh placeholder key and select it.
    pub fn add_entry(&mut self, value: V) -> usize {
        let placeholder = self.next_placeholder_key();
        self.entries.push(Entry::new(placeholder, value));
        self.selected = self.entries.len() - 1;
        self.selected
    }

    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.entries.remove(index);
        if self.selected >= self.entries.len() {
            self.selected = self.entries.len().saturating_sub(1);
        }
        true
    }

    pub fn remove_selected(&mut self) -> bool {
        match self.selected_index() {
            Some(index) => self.remove(index),
            None => false,
        }
    }

    pub fn move_selected(&mut self, delta: i32) -> bool {
        if self.entries.len() < 2 {
            return false;
        }
        let len = self.entries.len() as i32;
        let target = self.selected as i32 + delta;
        if target < 0 || target >= len {
            return false;
        }
        self.entries.swap(self.selected, target as usize);
        self.selected = target as usize;
        true
    }

    pub fn set_key(&mut self, index: usize, key: impl Into<String>) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        entry.key = key.into();
        true
    }

    pub fn set_value(&mut self, index: usize, value: V) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        entry.value = value;
        true
    }

    pub fn seed_from_map(&mut self, map: &IndexMap<String, V>) {
        self.entries = codec::to_entries(map);
        if self.entries.is_empty() {
            self.selected = 0;
        } else {
            self.selected = self.selected.min(self.entries.len() - 1);
        }
    }

    pub fn build_map(&self) -> IndexMap<String, V> {
        codec::to_map(&self.entries)
    }

    fn next_placeholder_key(&mut self) -> String {
        loop {
            let candidate = format!("key-{}", self.counter + 1);
            self.counter = self.counter.saturating_add(1);
            if !self.entries.iter().any(|entry| entry.key == candidate) {
                return candidate;
            }
        }
    }
}

impl<V: Clone> Default for EntryListState<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn add_entry_assigns_unique_placeholder_keys() {
        let mut list: EntryListState<Value> = EntryListState::new();
        list.add_entry(json!(1));
        list.add_entry(json!(2));
        assert_eq!(list.entries()[0].key, "key-1");
        assert_eq!(list.entries()[1].key, "key-2");
        list.set_key(0, "key-3");
        list.add_entry(json!(3));
        assert_eq!(list.entries()[2].key, "key-4", "collisions are skipped");
    }

    #[test]
    fn seed_then_build_round_trips() {
        let mut map = IndexMap::new();
        map.insert("docs".to_string(), json!("http://docs"));
        map.insert("repo".to_string(), json!("http://repo"));
        let list = EntryListState::from_map(&map);
        assert_eq!(list.build_map(), map);
    }

    #[test]
    fn build_map_drops_unnamed_rows() {
        let mut list: EntryListState<Value> = EntryListState::new();
        list.add_entry(json!("abandoned"));
        list.set_key(0, "");
        list.add_entry(json!("kept"));
        list.set_key(1, "k");
        let map = list.build_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["k"], json!("kept"));
    }

    #[test]
    fn remove_clamps_selection() {
        let mut list: EntryListState<Value> = EntryListState::new();
        list.add_entry(json!(1));
        list.add_entry(json!(2));
        assert_eq!(list.selected_index(), Some(1));
        assert!(list.remove_selected());
        assert_eq!(list.selected_index(), Some(0));
        assert!(list.remove_selected());
        assert_eq!(list.selected_index(), None);
        assert!(!list.remove_selected());
    }

    #[test]
    fn move_selected_preserves_row_content() {
        let mut list: EntryListState<Value> = EntryListState::new();
        list.add_entry(json!("a"));
        list.add_entry(json!("b"));
        list.set_key(0, "first");
        list.set_key(1, "second");
        assert!(list.move_selected(-1));
        let keys: Vec<_> = list.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["second", "first"]);
        assert!(!list.move_selected(-1), "cannot move past the top");
    }
}
