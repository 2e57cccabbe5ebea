use std::borrow::Cow;

use fsindex_common::{Result, error::Error};

use crate::{IntersectOptions, Strategy, intersect_sorted};

/// A sorted, duplicate-free id list whose length is known up front and whose
/// contents may be loaded on demand.
///
/// The N-way fold orders its inputs by [`len`](Self::len) and only calls
/// [`ids`](Self::ids) when it reaches a list, so lists skipped by an early
/// exit are never read.
pub trait SortedIds<T: Clone> {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ids(&self) -> Result<Cow<'_, [T]>>;
}

impl<T: Clone> SortedIds<T> for [T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn ids(&self) -> Result<Cow<'_, [T]>> {
        Ok(Cow::Borrowed(self))
    }
}

impl<T: Clone> SortedIds<T> for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn ids(&self) -> Result<Cow<'_, [T]>> {
        Ok(Cow::Borrowed(self.as_slice()))
    }
}

impl<T: Clone, S: SortedIds<T> + ?Sized> SortedIds<T> for &S {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn ids(&self) -> Result<Cow<'_, [T]>> {
        (**self).ids()
    }
}

/// Fails with `PrecondViolation` unless `ids` is strictly increasing.
pub fn validate_strictly_increasing<T: Ord + std::fmt::Debug>(ids: &[T]) -> Result<()> {
    match ids.windows(2).position(|w| w[0] >= w[1]) {
        None => Ok(()),
        Some(i) => Err(Error::precond_violation(format!(
            "list is not strictly increasing at position {}: {:?} followed by {:?}",
            i + 1,
            ids[i],
            ids[i + 1]
        ))),
    }
}

/// Stateless intersection front-end carrying the dispatch threshold and the
/// input validation switch.
#[derive(Debug, Clone, Default)]
pub struct Intersector {
    options: IntersectOptions,
}

impl Intersector {
    pub fn new(options: IntersectOptions) -> Intersector {
        Intersector { options }
    }

    pub fn options(&self) -> &IntersectOptions {
        &self.options
    }

    /// Intersects two lists, validating them first when validation is on.
    pub fn intersect_pair<T>(&self, a: &[T], b: &[T], strategy: Strategy) -> Result<Vec<T>>
    where
        T: Ord + Copy + std::fmt::Debug,
    {
        if self.options.validate {
            validate_strictly_increasing(a)?;
            validate_strictly_increasing(b)?;
        }
        Ok(intersect_sorted(a, b, strategy, self.options.ratio_threshold))
    }

    /// Intersects any number of lists.
    ///
    /// Lists are processed shortest first: the two shortest are intersected,
    /// then the running result with each next list. The fold stops as soon as
    /// the running result is empty, without loading the remaining lists. No
    /// lists yield an empty result; a single list is returned unchanged.
    pub fn intersect<T, L>(&self, lists: &[L], strategy: Strategy) -> Result<Vec<T>>
    where
        T: Ord + Copy + std::fmt::Debug,
        L: SortedIds<T>,
    {
        let mut order: Vec<usize> = (0..lists.len()).collect();
        order.sort_by_key(|&i| lists[i].len());

        let Some((&first, rest)) = order.split_first() else {
            return Ok(Vec::new());
        };
        if lists[first].is_empty() {
            log::debug!("intersection: shortest list is empty, nothing read");
            return Ok(Vec::new());
        }

        let first_ids = lists[first].ids()?;
        if self.options.validate {
            validate_strictly_increasing(&first_ids)?;
        }
        let mut acc: Cow<'_, [T]> = first_ids;
        for (step, &i) in rest.iter().enumerate() {
            let next = lists[i].ids()?;
            if self.options.validate {
                validate_strictly_increasing(&next)?;
            }
            let resolved = strategy.resolve(acc.len(), next.len(), self.options.ratio_threshold);
            let result = intersect_sorted(&acc, &next, resolved, self.options.ratio_threshold);
            log::debug!(
                "intersection step {}: {} x {} -> {} ({resolved})",
                step + 1,
                acc.len(),
                next.len(),
                result.len()
            );
            acc = Cow::Owned(result);
            if acc.is_empty() {
                log::debug!(
                    "intersection: empty after step {}, {} lists left unread",
                    step + 1,
                    rest.len() - step - 1
                );
                break;
            }
        }
        Ok(acc.into_owned())
    }
}
