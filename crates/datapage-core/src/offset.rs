/// The cumulative-offset index of a paging list.
///
/// Tracks the total element count and, lazily, the global index of the
/// first element of every page. While no structural edit has happened the
/// pages are uniform (`limit` elements each, shorter tail) and a
/// coordinate is plain division; the vector is only built once an edit
/// makes the page lengths irregular.
///
/// Edits are applied one non-overlapping page range at a time; `update`
/// assumes the previous edit has already been folded in.
#[derive(Debug, Clone)]
pub struct Offsets {
    total_count: usize,
    limit: usize,
    offsets: Option<Vec<usize>>,
}

fn initial_offsets(total_count: usize, limit: usize) -> Vec<usize> {
    if limit == 0 {
        Vec::new()
    } else {
        (0..total_count).step_by(limit).collect()
    }
}

impl Default for Offsets {
    fn default() -> Self {
        Offsets::new(0, 0)
    }
}

impl Offsets {
    pub fn new(total_count: usize, limit: usize) -> Self {
        Self {
            total_count,
            limit,
            offsets: None,
        }
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Map a global element index to `(page number, index within page)`.
    pub fn get_coordinate(&self, index: usize) -> (usize, usize) {
        match &self.offsets {
            None => {
                if self.limit == 0 {
                    (0, index)
                } else {
                    (index / self.limit, index % self.limit)
                }
            }
            Some(offsets) => {
                if offsets.is_empty() {
                    return (0, index);
                }
                let page = offsets.partition_point(|&offset| offset <= index) - 1;
                (page, index - offsets[page])
            }
        }
    }

    /// Fold in the replacement of pages `[start, stop)` by pages with the
    /// given lengths, shifting every later offset by the net size delta.
    pub fn update(&mut self, start: usize, stop: usize, lengths: &[usize]) {
        let total = self.total_count;
        let limit = self.limit;
        let offsets = self
            .offsets
            .get_or_insert_with(|| initial_offsets(total, limit));

        let base = offsets.get(start).copied().unwrap_or(total);
        let last = offsets.get(stop).copied().unwrap_or(total);

        let mut partial = Vec::with_capacity(lengths.len());
        let mut acc = base;
        for &len in lengths {
            partial.push(acc);
            acc += len;
        }

        let diff = acc as isize - last as isize;
        if diff != 0 {
            for offset in offsets[stop..].iter_mut() {
                *offset = (*offset as isize + diff) as usize;
            }
        }
        offsets.splice(start..stop, partial);

        if diff != 0 {
            self.total_count = (total as isize + diff) as usize;
        }
    }

    /// Fold in pages appended at the end.
    pub fn extend(&mut self, lengths: &[usize]) {
        let total = self.total_count;
        let limit = self.limit;
        let offsets = self
            .offsets
            .get_or_insert_with(|| initial_offsets(total, limit));

        let mut acc = total;
        for &len in lengths {
            offsets.push(acc);
            acc += len;
        }
        self.total_count = acc;
    }
}
