use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use indexmap::IndexMap;
use num_bigint::{BigInt, BigUint};
use uuid::Uuid;

use super::{Array, Iterable, Kind, List, Map, Reflect};
use crate::values::Decimal;

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        )*
    };
}

impl_scalar!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    &'static str,
    std::time::Duration,
    NaiveDate,
    NaiveTime,
    NaiveDateTime,
    DateTime<Utc>,
    DateTime<FixedOffset>,
    DateTime<Local>,
    chrono::Duration,
    Uuid,
    BigInt,
    BigUint,
    Decimal,
    serde_json::Value,
);

impl Reflect for () {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn kind(&self) -> Kind<'_> {
        Kind::Null
    }
}

// Strings enumerate their bytes, so a catch-all iterable handler would split them
// unless they are classified as leaves first.
impl Reflect for String {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_iterable(&self) -> Option<&dyn Iterable> {
        Some(self)
    }
}

impl Iterable for String {
    fn elements(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.as_bytes().iter().map(|b| b as &dyn Reflect))
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn kind(&self) -> Kind<'_> {
        Kind::Optional {
            inner: self.as_ref().map(|v| v as &dyn Reflect),
            inner_type: TypeId::of::<T>(),
        }
    }
}

// A box is a wrapper that is never empty.
impl<T: Reflect> Reflect for Box<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn kind(&self) -> Kind<'_> {
        Kind::Optional {
            inner: Some(&**self),
            inner_type: TypeId::of::<T>(),
        }
    }
}

/// Positional views over anything that derefs to a slice.
macro_rules! impl_sequence {
    ($(impl[$($generics:tt)*] $ty:ty;)*) => {
        $(
            impl<$($generics)*> Reflect for $ty {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_list(&self) -> Option<&dyn List> {
                    Some(self)
                }

                fn as_iterable(&self) -> Option<&dyn Iterable> {
                    Some(self)
                }

                fn as_array(&self) -> Option<&dyn Array> {
                    Some(self)
                }
            }

            impl<$($generics)*> List for $ty {
                fn len(&self) -> usize {
                    self[..].len()
                }

                fn get(&self, index: usize) -> Option<&dyn Reflect> {
                    self[..].get(index).map(|v| v as &dyn Reflect)
                }
            }

            impl<$($generics)*> Iterable for $ty {
                fn elements(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
                    Box::new(self[..].iter().map(|v| v as &dyn Reflect))
                }
            }

            impl<$($generics)*> Array for $ty {
                fn rank(&self) -> usize {
                    1
                }

                fn bounds(&self, _dimension: usize) -> (isize, isize) {
                    (0, self[..].len() as isize - 1)
                }

                fn element(&self, indices: &[isize]) -> Option<&dyn Reflect> {
                    match indices {
                        [i] if *i >= 0 => self[..].get(*i as usize).map(|v| v as &dyn Reflect),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_sequence! {
    impl[T: Reflect] Vec<T>;
    impl[T: Reflect, const N: usize] [T; N];
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_list(&self) -> Option<&dyn List> {
        Some(self)
    }

    fn as_iterable(&self) -> Option<&dyn Iterable> {
        Some(self)
    }
}

impl<T: Reflect> List for VecDeque<T> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        VecDeque::get(self, index).map(|v| v as &dyn Reflect)
    }
}

impl<T: Reflect> Iterable for VecDeque<T> {
    fn elements(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|v| v as &dyn Reflect))
    }
}

macro_rules! impl_set {
    ($($set:ident<T: $($bound:path),*>;)*) => {
        $(
            impl<T: Reflect $(+ $bound)*> Reflect for $set<T> {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_iterable(&self) -> Option<&dyn Iterable> {
                    Some(self)
                }
            }

            impl<T: Reflect $(+ $bound)*> Iterable for $set<T> {
                fn elements(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
                    Box::new(self.iter().map(|v| v as &dyn Reflect))
                }
            }
        )*
    };
}

impl_set! {
    HashSet<T: Eq, Hash>;
    BTreeSet<T: Ord>;
}

macro_rules! impl_map {
    ($($map:ident<K: $($bound:path),*>;)*) => {
        $(
            impl<K, V> Reflect for $map<K, V>
            where
                K: Any + fmt::Debug $(+ $bound)*,
                V: Reflect,
            {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_map(&self) -> Option<&dyn Map> {
                    Some(self)
                }
            }

            impl<K, V> Map for $map<K, V>
            where
                K: Any + fmt::Debug $(+ $bound)*,
                V: Reflect,
            {
                fn key_type(&self) -> TypeId {
                    TypeId::of::<K>()
                }

                fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Any, &dyn Reflect)> + '_> {
                    Box::new(self.iter().map(|(k, v)| (k as &dyn Any, v as &dyn Reflect)))
                }
            }
        )*
    };
}

impl_map! {
    HashMap<K: Eq, Hash>;
    BTreeMap<K: Ord>;
    IndexMap<K: Eq, Hash>;
}
