use crate::address;
use crate::engine::{empty, Entries, Flatten, Handler};
use crate::reflect::Reflect;

/// Flattens arrays of any rank as `prefix[i,j,...]`, visiting elements in row-major
/// order from each dimension's lower bound to its upper bound.
///
/// An array with an empty dimension produces nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayHandler;

impl Handler for ArrayHandler {
    fn can_handle(&self, _prefix: &str, value: &dyn Reflect) -> bool {
        value.as_array().is_some()
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let Some(array) = value.as_array() else {
            return empty();
        };
        let bounds = (0..array.rank()).map(|d| array.bounds(d)).collect();

        Box::new(Odometer::new(bounds).flat_map(move |indices| {
            match array.element(&indices) {
                Some(item) => engine.flatten(address::indices(&prefix, &indices), item),
                None => empty(),
            }
        }))
    }
}

/// Enumerates every index tuple within inclusive per-dimension bounds, last dimension
/// fastest.
#[derive(Debug, Clone)]
pub struct Odometer {
    bounds: Vec<(isize, isize)>,
    current: Option<Vec<isize>>,
}

impl Odometer {
    pub fn new(bounds: Vec<(isize, isize)>) -> Self {
        let exhausted = bounds.is_empty() || bounds.iter().any(|&(lower, upper)| upper < lower);
        let current = if exhausted {
            None
        } else {
            Some(bounds.iter().map(|&(lower, _)| lower).collect())
        };
        Odometer { bounds, current }
    }
}

impl Iterator for Odometer {
    type Item = Vec<isize>;

    fn next(&mut self) -> Option<Vec<isize>> {
        let current = self.current.take()?;

        let mut next = current.clone();
        for dim in (0..next.len()).rev() {
            let (lower, upper) = self.bounds[dim];
            if next[dim] < upper {
                next[dim] += 1;
                self.current = Some(next);
                break;
            }
            next[dim] = lower;
        }

        Some(current)
    }
}
