use crate::error::PagingError;

/// Slice arguments in the array-slice convention: optional, possibly
/// negative bounds and step. `None` means "from the edge the step walks
/// away from" / "to the edge the step walks towards".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceArgs {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl SliceArgs {
    pub fn new(
        start: impl Into<Option<isize>>,
        stop: impl Into<Option<isize>>,
        step: impl Into<Option<isize>>,
    ) -> Self {
        Self {
            start: start.into(),
            stop: stop.into(),
            step: step.into(),
        }
    }

    /// The whole sequence, step 1.
    pub fn full() -> Self {
        Self::default()
    }

    /// `[start, stop)` with step 1.
    pub fn range(start: isize, stop: isize) -> Self {
        Self::new(start, stop, None)
    }

    pub fn step(step: isize) -> Self {
        Self::new(None, None, step)
    }

    /// Resolve against a sequence of the given length, clamping bounds and
    /// wrapping negative indices. Returns `(start, stop, step)` such that
    /// the selected indices are `start, start + step, ...` strictly before
    /// `stop` (after `stop` for a negative step). Matches CPython
    /// `slice.indices` semantics; a zero step is rejected.
    pub fn normalize(self, len: usize) -> Result<(isize, isize, isize), PagingError> {
        let len = len as isize;
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(PagingError::ZeroStep);
        }
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };

        let resolve = |bound: Option<isize>, default: isize| match bound {
            None => default,
            Some(b) if b < 0 => (b + len).max(lower),
            Some(b) => b.min(upper),
        };

        let start = resolve(self.start, if step > 0 { lower } else { upper });
        let stop = resolve(self.stop, if step > 0 { upper } else { lower });
        Ok((start, stop, step))
    }
}

/// Number of indices selected by a normalized `(start, stop, step)` triple.
pub(crate) fn span_len(start: isize, stop: isize, step: isize) -> usize {
    if step > 0 {
        if start >= stop {
            0
        } else {
            ((stop - start - 1) / step + 1) as usize
        }
    } else if start <= stop {
        0
    } else {
        ((start - stop - 1) / -step + 1) as usize
    }
}

/// Python-style modulo: the result takes the sign of the divisor.
pub(crate) fn py_mod(a: isize, b: isize) -> isize {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) { r + b } else { r }
}

/// A strided index sequence over a source array of known length: the
/// resolved form of a slice. Supports re-slicing without touching the
/// source, which is what keeps sliced pages lazy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StridedSpan {
    start: isize,
    step: isize,
    len: usize,
}

impl StridedSpan {
    /// The identity span over a source of `len` elements.
    pub fn contiguous(len: usize) -> Self {
        Self {
            start: 0,
            step: 1,
            len,
        }
    }

    pub fn from_args(args: SliceArgs, source_len: usize) -> Result<Self, PagingError> {
        let (start, stop, step) = args.normalize(source_len)?;
        Ok(Self {
            start,
            step,
            len: span_len(start, stop, step),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Map a span-local index to a source index. `i` must be `< len()`.
    pub fn get(&self, i: usize) -> usize {
        (self.start + i as isize * self.step) as usize
    }

    /// Compose: slice this span as if it were a sequence of `len()`
    /// elements, yielding a new span over the original source.
    pub fn slice(&self, args: SliceArgs) -> Result<Self, PagingError> {
        let (start, stop, step) = args.normalize(self.len)?;
        Ok(Self {
            start: self.start + start * self.step,
            step: self.step * step,
            len: span_len(start, stop, step),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + use<> {
        let span = *self;
        (0..span.len).map(move |i| span.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(args: SliceArgs, len: usize) -> Vec<usize> {
        StridedSpan::from_args(args, len)
            .unwrap()
            .iter()
            .collect()
    }

    #[test]
    fn normalize_clamps_like_python() {
        assert_eq!(SliceArgs::full().normalize(5).unwrap(), (0, 5, 1));
        assert_eq!(SliceArgs::new(1, 8, 2).normalize(10).unwrap(), (1, 8, 2));
        assert_eq!(SliceArgs::new(-3, None, None).normalize(5).unwrap(), (2, 5, 1));
        assert_eq!(SliceArgs::new(3, 100, None).normalize(5).unwrap(), (3, 5, 1));
        assert_eq!(SliceArgs::new(-100, 2, None).normalize(5).unwrap(), (0, 2, 1));
        assert_eq!(SliceArgs::step(-1).normalize(5).unwrap(), (4, -1, -1));
        assert_eq!(SliceArgs::new(None, 1, -2).normalize(6).unwrap(), (5, 1, -2));
    }

    #[test]
    fn zero_step_rejected() {
        assert!(matches!(
            SliceArgs::step(0).normalize(5),
            Err(PagingError::ZeroStep)
        ));
    }

    #[test]
    fn strided_indices() {
        assert_eq!(indices(SliceArgs::new(1, 8, 2), 10), vec![1, 3, 5, 7]);
        assert_eq!(indices(SliceArgs::step(-1), 4), vec![3, 2, 1, 0]);
        assert_eq!(indices(SliceArgs::new(None, None, -2), 5), vec![4, 2, 0]);
        assert_eq!(indices(SliceArgs::range(3, 3), 5), Vec::<usize>::new());
        assert_eq!(indices(SliceArgs::range(4, 2), 5), Vec::<usize>::new());
    }

    #[test]
    fn composition_matches_reslicing() {
        // range(10)[::-1][1:4] -> [8, 7, 6]
        let reversed = StridedSpan::contiguous(10)
            .slice(SliceArgs::step(-1))
            .unwrap();
        let window = reversed.slice(SliceArgs::range(1, 4)).unwrap();
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![8, 7, 6]);

        // range(10)[1:9:2][::-1] -> [7, 5, 3, 1]
        let strided = StridedSpan::contiguous(10)
            .slice(SliceArgs::new(1, 9, 2))
            .unwrap();
        let back = strided.slice(SliceArgs::step(-1)).unwrap();
        assert_eq!(back.iter().collect::<Vec<_>>(), vec![7, 5, 3, 1]);
    }

    #[test]
    fn py_mod_sign_follows_divisor() {
        assert_eq!(py_mod(-7, 3), 2);
        assert_eq!(py_mod(7, -3), -2);
        assert_eq!(py_mod(6, 3), 0);
        assert_eq!(py_mod(6, -3), 0);
    }

    #[test]
    fn empty_source() {
        assert_eq!(indices(SliceArgs::full(), 0), Vec::<usize>::new());
        assert_eq!(indices(SliceArgs::step(-1), 0), Vec::<usize>::new());
    }
}
