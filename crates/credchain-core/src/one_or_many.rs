//! A value that serializes as either a single item or a sequence.
use serde::{Deserialize, Serialize};

/// One item or many, matching the JSON-LD convention of collapsing
/// single-element arrays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self {
            OneOrMany::One(item) => item == value,
            OneOrMany::Many(values) => values.contains(value),
        }
    }

    pub fn first(&self) -> Option<&T> {
        match self {
            OneOrMany::One(item) => Some(item),
            OneOrMany::Many(values) => values.first(),
        }
    }

    /// Returns the item if there is exactly one.
    pub fn to_single(&self) -> Option<&T> {
        match self {
            OneOrMany::One(item) => Some(item),
            OneOrMany::Many(values) if values.len() == 1 => values.first(),
            OneOrMany::Many(_) => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item).iter(),
            OneOrMany::Many(values) => values.iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a OneOrMany<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
