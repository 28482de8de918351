//! Append-only storage addressed by typed keys
//!
//! Packages, files, types, values and functions live in arenas owned by
//! the session and refer to each other by key, so shared and cyclic
//! references (imports, pointer backreferences) never form ownership cycles.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Typed arena key
pub trait ArenaKey: Copy + Eq + std::hash::Hash + std::fmt::Debug {
    fn from_usize(idx: usize) -> Self;
    fn as_usize(&self) -> usize;
}

/// Append-only arena; entries are never removed
#[derive(Debug, Clone)]
pub struct Arena<K: ArenaKey, V> {
    vec: Vec<V>,
    _marker: PhantomData<K>,
}

impl<K: ArenaKey, V> Default for Arena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V> Arena<K, V> {
    pub fn new() -> Self {
        Self {
            vec: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Insert a value and return its key
    #[inline]
    pub fn insert(&mut self, value: V) -> K {
        let idx = self.vec.len();
        self.vec.push(value);
        K::from_usize(idx)
    }

    /// Key the next insert will return
    #[inline]
    pub fn next_key(&self) -> K {
        K::from_usize(self.vec.len())
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.vec.get(key.as_usize())
    }

    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.vec.get_mut(key.as_usize())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.vec.iter().enumerate().map(|(i, v)| (K::from_usize(i), v))
    }
}

impl<K: ArenaKey, V> Index<K> for Arena<K, V> {
    type Output = V;

    #[inline]
    fn index(&self, key: K) -> &Self::Output {
        &self.vec[key.as_usize()]
    }
}

impl<K: ArenaKey, V> IndexMut<K> for Arena<K, V> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        &mut self.vec[key.as_usize()]
    }
}

/// Define typed arena keys
#[macro_export]
macro_rules! define_key {
    ($($(#[$attr:meta])* $vis:vis struct $name:ident;)*) => {
        $(
            $(#[$attr])*
            #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
            #[serde(transparent)]
            #[repr(transparent)]
            $vis struct $name(u32);

            impl $name {
                #[inline]
                pub fn raw(&self) -> u32 {
                    self.0
                }
            }

            impl $crate::utils::ArenaKey for $name {
                #[inline]
                fn from_usize(idx: usize) -> Self {
                    Self(idx as u32)
                }

                #[inline]
                fn as_usize(&self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_key! {
        struct TestKey;
    }

    #[test]
    fn test_arena_insert_and_get() {
        let mut arena: Arena<TestKey, String> = Arena::new();
        assert_eq!(arena.next_key().raw(), 0);
        let k1 = arena.insert("hello".to_string());
        let k2 = arena.insert("world".to_string());

        assert_eq!(arena[k1], "hello");
        assert_eq!(arena[k2], "world");
        assert_eq!(arena.len(), 2);
        assert!(arena.get(TestKey::from_usize(5)).is_none());
    }

    #[test]
    fn test_arena_iter_keys() {
        let mut arena: Arena<TestKey, i32> = Arena::new();
        arena.insert(10);
        arena.insert(20);

        let keys: Vec<u32> = arena.iter().map(|(k, _)| k.raw()).collect();
        assert_eq!(keys, vec![0, 1]);
    }
}
