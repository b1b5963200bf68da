//! Ordered, multi-valued tag stores.
//!
//! A [`MetadataStore`] keeps the data of one metadata family in the order the
//! container stored them. Several [`Datum`]s may share a key when the tag is
//! repeatable (IPTC keywords, XMP bags); their relative order is meaningful.
//!
//! [`MetadataStore::set_values`] is the single mutation entry point used by
//! the session for both single- and multi-value assignment. It reuses
//! existing data positionally so that a datum's [`DatumId`] survives an
//! overwrite, appends when the new list is longer, and drops the surplus when
//! it is shorter.

use crate::error::{MetadataError, Result};
use crate::key::{Family, TagKey};

/// Store-assigned identity of a datum.
///
/// Overwriting a datum's value keeps its id; appended data get fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatumId(u64);

/// One stored `(key, value)` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datum {
    id: DatumId,
    key: TagKey,
    value: String,
}

impl Datum {
    pub fn id(&self) -> DatumId {
        self.id
    }

    pub fn key(&self) -> &TagKey {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    data: Vec<Datum>,
    next_id: u64,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Datum> {
        self.data.iter()
    }

    /// Append a datum at the end of the store.
    pub fn push(&mut self, key: TagKey, value: impl Into<String>) -> DatumId {
        let id = DatumId(self.next_id);
        self.next_id += 1;
        self.data.push(Datum {
            id,
            key,
            value: value.into(),
        });
        id
    }

    /// Unique keys in order of first appearance.
    pub fn keys(&self) -> Vec<&TagKey> {
        let mut keys: Vec<&TagKey> = Vec::new();
        for datum in &self.data {
            if !keys.contains(&&datum.key) {
                keys.push(&datum.key);
            }
        }
        keys
    }

    /// All data carrying `key`, in store order.
    pub fn values<'a>(&'a self, key: &'a TagKey) -> impl Iterator<Item = &'a Datum> + 'a {
        self.data.iter().filter(move |d| &d.key == key)
    }

    pub fn contains(&self, key: &TagKey) -> bool {
        self.data.iter().any(|d| &d.key == key)
    }

    /// Keys of a single family, in order of first appearance.
    pub fn keys_of(&self, family: Family) -> Vec<&TagKey> {
        self.keys()
            .into_iter()
            .filter(|k| k.family() == family)
            .collect()
    }

    fn find_from(&self, key: &TagKey, start: usize) -> Option<usize> {
        self.data
            .iter()
            .skip(start)
            .position(|d| &d.key == key)
            .map(|offset| start + offset)
    }

    /// Replace every occurrence of `key` with `values`, in order.
    ///
    /// Existing data are overwritten front to back and keep their ids; extra
    /// values are appended at the end of the store; leftover occurrences are
    /// removed. An empty `values` removes the key entirely. Fails without
    /// touching the store when a non-repeatable key receives more than one
    /// value.
    pub fn set_values<S: AsRef<str>>(
        &mut self,
        key: &TagKey,
        values: &[S],
        repeatable: bool,
    ) -> Result<()> {
        if !repeatable && values.len() > 1 {
            return Err(MetadataError::NonRepeatableTag(key.to_string()));
        }

        let mut cursor = self.find_from(key, 0);
        let (mut overwritten, mut appended) = (0usize, 0usize);
        for value in values {
            match cursor {
                Some(pos) => {
                    self.data[pos].value = value.as_ref().to_string();
                    overwritten += 1;
                    cursor = self.find_from(key, pos + 1);
                }
                None => {
                    self.push(key.clone(), value.as_ref());
                    appended += 1;
                }
            }
        }

        let mut removed = 0usize;
        if let Some(mut pos) = cursor {
            while let Some(found) = self.find_from(key, pos) {
                self.data.remove(found);
                removed += 1;
                pos = found;
            }
        }

        log::debug!(
            "{key}: {overwritten} overwritten, {appended} appended, {removed} removed"
        );
        Ok(())
    }

    /// Remove every occurrence of `key`, returning how many were removed.
    pub fn remove_all(&mut self, key: &TagKey) -> usize {
        let before = self.data.len();
        self.data.retain(|d| &d.key != key);
        before - self.data.len()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Whether both stores hold the same keys and values in the same order.
    /// Datum ids are ignored.
    pub fn same_content(&self, other: &MetadataStore) -> bool {
        self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.key == b.key && a.value == b.value)
    }
}

impl<'a> IntoIterator for &'a MetadataStore {
    type Item = &'a Datum;
    type IntoIter = std::slice::Iter<'a, Datum>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
