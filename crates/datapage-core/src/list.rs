use datapage_common::Value;

use crate::error::PagingError;
use crate::offset::Offsets;
use crate::page::{Mapper, Page, PageArray};
use crate::span::{SliceArgs, py_mod, span_len};

/// A list composed of multiple pages.
///
/// Pages are ordered and contiguous in logical index space; zero-length
/// pages are never retained. All structural edits funnel through
/// [`PagingList::update_pages`], which substitutes whole new pages and
/// never mutates a materialized backing array, so clones sharing pages
/// stay valid. Pages outside an edited range keep their lazy state.
#[derive(Debug, Clone, Default)]
pub struct PagingList {
    pages: Vec<Page>,
    offsets: Offsets,
}

impl PagingList {
    pub fn new(values: Vec<Value>) -> Self {
        let len = values.len();
        let pages = if len != 0 {
            vec![Page::eager(values)]
        } else {
            Vec::new()
        };
        Self {
            pages,
            offsets: Offsets::new(len, len),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub(crate) fn from_pages(pages: Vec<Page>, offsets: Offsets) -> Self {
        Self { pages, offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.total_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn pages(&self) -> &[Page] {
        &self.pages
    }

    fn normalize_index(&self, index: isize) -> Result<usize, PagingError> {
        let len = self.len();
        let adjusted = if index < 0 {
            index + len as isize
        } else {
            index
        };
        if adjusted < 0 || adjusted >= len as isize {
            return Err(PagingError::IndexOutOfRange { index, len });
        }
        Ok(adjusted as usize)
    }

    /// Element at a global index; negative indices count from the end.
    pub fn get(&self, index: isize) -> Result<Value, PagingError> {
        let index = self.normalize_index(index)?;
        let (page, local) = self.offsets.get_coordinate(index);
        self.pages[page].get(local)
    }

    /// Iterate all elements, materializing one page at a time. Elements
    /// yielded before a failing page are unaffected by the failure.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            pages: &self.pages,
            current: None,
            next_page: 0,
        }
    }

    pub fn to_contiguous_array(&self) -> Result<Vec<Value>, PagingError> {
        let mut out = Vec::with_capacity(self.len());
        for page in &self.pages {
            let array = page.as_array()?;
            out.extend(array.iter().cloned());
        }
        Ok(out)
    }

    /// A copy whose elements are converted by `mapper` on read.
    ///
    /// Conversion is deferred like fetching: pages keep their lazy state
    /// and the mapper runs when a page is first touched, sharing the
    /// underlying fetch with the unmapped list. Values written into the
    /// mapped copy afterwards are stored as given, not passed through the
    /// mapper.
    pub fn map(&self, mapper: Mapper) -> PagingList {
        let pages = self
            .pages
            .iter()
            .map(|page| page.clone().map(mapper.clone()))
            .collect();
        PagingList {
            pages,
            offsets: self.offsets.clone(),
        }
    }

    /// A sliced copy of this list. Page views are taken lazily; no page is
    /// fetched or copied.
    pub fn get_slice(&self, args: SliceArgs) -> Result<PagingList, PagingError> {
        let (start, stop, step) = args.normalize(self.len())?;
        let pages = if step > 0 {
            self.slice_pages_forward(start, stop, step)?
        } else {
            self.slice_pages_backward(start, stop, step)?
        };

        let mut offsets = Offsets::new(0, 0);
        let lengths: Vec<usize> = pages.iter().map(Page::len).collect();
        offsets.extend(&lengths);
        Ok(PagingList { pages, offsets })
    }

    fn slice_pages_forward(
        &self,
        start: isize,
        stop: isize,
        step: isize,
    ) -> Result<Vec<Page>, PagingError> {
        if start >= stop {
            return Ok(Vec::new());
        }

        let (start_i, start_j) = self.offsets.get_coordinate(start as usize);
        let (stop_i, stop_j) = self.offsets.get_coordinate(stop as usize - 1);
        let stop_j = stop_j + 1;

        if start_i == stop_i {
            return Ok(vec![self.pages[start_i].get_slice(SliceArgs::new(
                start_j as isize,
                stop_j as isize,
                step,
            ))?]);
        }

        if step == 1 {
            let mut pages = Vec::with_capacity(stop_i - start_i + 1);
            pages.push(
                self.pages[start_i].get_slice(SliceArgs::new(start_j as isize, None, None))?,
            );
            pages.extend(self.pages[start_i + 1..stop_i].iter().cloned());
            pages.push(self.pages[stop_i].get_slice(SliceArgs::new(None, stop_j as isize, None))?);
            return Ok(pages);
        }

        // Strided: track how far past the last selected index each page
        // boundary sits so every page starts on the stride.
        let start_page = &self.pages[start_i];
        let mut offset = start_page.len() - start_j;
        let mut pages =
            vec![start_page.get_slice(SliceArgs::new(start_j as isize, None, step))?];

        for page in &self.pages[start_i + 1..stop_i] {
            let slice_start = py_mod(-(offset as isize), step);
            let page_len = page.len();
            if (slice_start as usize) < page_len {
                pages.push(page.get_slice(SliceArgs::new(slice_start, None, step))?);
            }
            offset += page_len;
        }

        let stop_page = &self.pages[stop_i];
        let slice_start = py_mod(-(offset as isize), step);
        if (slice_start as usize) < stop_j {
            pages.push(stop_page.get_slice(SliceArgs::new(slice_start, stop_j as isize, step))?);
        }
        Ok(pages)
    }

    fn slice_pages_backward(
        &self,
        start: isize,
        stop: isize,
        step: isize,
    ) -> Result<Vec<Page>, PagingError> {
        if start <= stop {
            return Ok(Vec::new());
        }

        let (start_i, start_j) = self.offsets.get_coordinate(start as usize);
        let (stop_i, stop_j) = self.offsets.get_coordinate((stop + 1) as usize);
        // Local stop bound walking backwards; entering the page start means
        // "no bound" rather than index -1, which would wrap.
        let stop_j: Option<isize> = if stop_j != 0 {
            Some(stop_j as isize - 1)
        } else {
            None
        };

        if start_i == stop_i {
            return Ok(vec![self.pages[start_i].get_slice(SliceArgs::new(
                Some(start_j as isize),
                stop_j,
                Some(step),
            ))?]);
        }

        if step == -1 {
            let mut pages = Vec::with_capacity(start_i - stop_i + 1);
            pages.push(
                self.pages[start_i].get_slice(SliceArgs::new(start_j as isize, None, step))?,
            );
            for page in self.pages[stop_i + 1..start_i].iter().rev() {
                pages.push(page.get_slice(SliceArgs::step(-1))?);
            }
            pages.push(self.pages[stop_i].get_slice(SliceArgs::new(None, stop_j, Some(step)))?);
            return Ok(pages);
        }

        let start_page = &self.pages[start_i];
        let mut offset = start_j as isize + 1;
        let mut pages =
            vec![start_page.get_slice(SliceArgs::new(start_j as isize, None, step))?];

        for page in self.pages[stop_i + 1..start_i].iter().rev() {
            let page_len = page.len() as isize;
            let slice_start = page_len + py_mod(offset, step) - 1;
            if slice_start >= 0 {
                pages.push(page.get_slice(SliceArgs::new(slice_start, None, step))?);
            }
            offset += page_len;
        }

        let stop_page = &self.pages[stop_i];
        let slice_start = stop_page.len() as isize + py_mod(offset, step) - 1;
        if slice_start > stop_j.unwrap_or(-1) {
            pages.push(stop_page.get_slice(SliceArgs::new(Some(slice_start), stop_j, Some(step)))?);
        }
        Ok(pages)
    }

    /// Replace the element span `[start, stop)` with the given pages.
    ///
    /// The non-empty remainders of the boundary pages are kept as sliced
    /// views; every page outside `[start, stop)` is untouched, lazy state
    /// included. This single splice underlies set, delete, and
    /// slice-assignment.
    pub(crate) fn update_pages(
        &mut self,
        start: usize,
        stop: usize,
        new_pages: Vec<Page>,
    ) -> Result<(), PagingError> {
        let stop = stop.max(start);
        if start == stop && new_pages.is_empty() {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(start, stop, pages = new_pages.len(), "splicing page range");

        if start == stop {
            return self.insert_pages(start, new_pages);
        }

        let (start_i, start_j) = self.offsets.get_coordinate(start);
        let (stop_i, stop_j) = self.offsets.get_coordinate(stop - 1);

        let mut update = Vec::with_capacity(new_pages.len() + 2);
        let left = self.pages[start_i].get_slice(SliceArgs::new(None, start_j as isize, None))?;
        if !left.is_empty() {
            update.push(left);
        }
        update.extend(new_pages);
        let right =
            self.pages[stop_i].get_slice(SliceArgs::new(stop_j as isize + 1, None, None))?;
        if !right.is_empty() {
            update.push(right);
        }

        let lengths: Vec<usize> = update.iter().map(Page::len).collect();
        self.pages.splice(start_i..=stop_i, update);
        self.offsets.update(start_i, stop_i + 1, &lengths);
        Ok(())
    }

    /// Insert pages before the element at `index` (`index == len` appends),
    /// splitting the containing page when the position is not a page
    /// boundary.
    fn insert_pages(&mut self, index: usize, new_pages: Vec<Page>) -> Result<(), PagingError> {
        let new_pages: Vec<Page> = new_pages.into_iter().filter(|p| !p.is_empty()).collect();
        if new_pages.is_empty() {
            return Ok(());
        }

        let (page_i, local) = if index == self.len() {
            (self.pages.len(), 0)
        } else {
            self.offsets.get_coordinate(index)
        };

        if local == 0 {
            let lengths: Vec<usize> = new_pages.iter().map(Page::len).collect();
            self.offsets.update(page_i, page_i, &lengths);
            self.pages.splice(page_i..page_i, new_pages);
            return Ok(());
        }

        let split = &self.pages[page_i];
        let left = split.get_slice(SliceArgs::new(None, local as isize, None))?;
        let right = split.get_slice(SliceArgs::new(local as isize, None, None))?;

        let mut update = Vec::with_capacity(new_pages.len() + 2);
        update.push(left);
        update.extend(new_pages);
        update.push(right);

        let lengths: Vec<usize> = update.iter().map(Page::len).collect();
        self.pages.splice(page_i..=page_i, update);
        self.offsets.update(page_i, page_i + 1, &lengths);
        Ok(())
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: isize, value: Value) -> Result<(), PagingError> {
        let index = self.normalize_index(index)?;
        self.update_pages(index, index + 1, vec![Page::eager(vec![value])])
    }

    /// Replace the elements selected by `args` with another list's
    /// elements. For step 1 the source pages are spliced in wholesale; for
    /// step -1 they are reversed as views first; any other step scatters
    /// element by element and requires exact length equality.
    pub fn set_slice(&mut self, args: SliceArgs, values: &PagingList) -> Result<(), PagingError> {
        let (start, stop, step) = args.normalize(self.len())?;

        if step == 1 {
            return self.update_pages(
                start as usize,
                stop.max(start) as usize,
                values.pages.to_vec(),
            );
        }

        if step == -1 {
            let span_start = (stop + 1) as usize;
            let span_stop = (start.max(stop) + 1) as usize;
            if values.len() != span_stop - span_start {
                return Err(PagingError::LengthMismatch {
                    expected: span_stop - span_start,
                    got: values.len(),
                });
            }
            let mut pages = Vec::with_capacity(values.pages.len());
            for page in values.pages.iter().rev() {
                pages.push(page.get_slice(SliceArgs::step(-1))?);
            }
            return self.update_pages(span_start, span_stop, pages);
        }

        self.set_slice_stepped(start, stop, step, values)
    }

    /// `set_slice` with elements from an iterator instead of a list.
    pub fn set_slice_iterable<I>(&mut self, args: SliceArgs, values: I) -> Result<(), PagingError>
    where
        I: IntoIterator<Item = Value>,
    {
        let (start, stop, step) = args.normalize(self.len())?;

        if step == 1 {
            let array: Vec<Value> = values.into_iter().collect();
            let pages = if array.is_empty() {
                Vec::new()
            } else {
                vec![Page::eager(array)]
            };
            return self.update_pages(start as usize, stop.max(start) as usize, pages);
        }

        if step == -1 {
            let mut array: Vec<Value> = values.into_iter().collect();
            array.reverse();

            let span_start = (stop + 1) as usize;
            let span_stop = (start.max(stop) + 1) as usize;
            if array.len() != span_stop - span_start {
                return Err(PagingError::LengthMismatch {
                    expected: span_stop - span_start,
                    got: array.len(),
                });
            }
            let pages = if array.is_empty() {
                Vec::new()
            } else {
                vec![Page::eager(array)]
            };
            return self.update_pages(span_start, span_stop, pages);
        }

        let values = PagingList::new(values.into_iter().collect());
        self.set_slice_stepped(start, stop, step, &values)
    }

    fn set_slice_stepped(
        &mut self,
        start: isize,
        stop: isize,
        step: isize,
        values: &PagingList,
    ) -> Result<(), PagingError> {
        let expected = span_len(start, stop, step);
        if values.len() != expected {
            return Err(PagingError::LengthMismatch {
                expected,
                got: values.len(),
            });
        }

        let targets: Vec<usize> = (0..expected)
            .map(|i| (start + i as isize * step) as usize)
            .collect();
        let pairs = targets.into_iter().zip(0..expected);

        // Positive step walks targets in reverse so earlier indices stay
        // valid while pages resize; negative step is already descending.
        let scatter = |list: &mut Self, target: usize, source: usize| -> Result<(), PagingError> {
            let (x, y) = values.offsets.get_coordinate(source);
            let page =
                values.pages[x].get_slice(SliceArgs::range(y as isize, y as isize + 1))?;
            list.update_pages(target, target + 1, vec![page])
        };

        if step > 0 {
            for (target, source) in pairs.collect::<Vec<_>>().into_iter().rev() {
                scatter(self, target, source)?;
            }
        } else {
            for (target, source) in pairs {
                scatter(self, target, source)?;
            }
        }
        Ok(())
    }

    /// Remove the element at `index`.
    pub fn delete(&mut self, index: isize) -> Result<(), PagingError> {
        let index = self.normalize_index(index)?;
        self.update_pages(index, index + 1, Vec::new())
    }

    /// Remove the elements selected by `args`.
    pub fn delete_slice(&mut self, args: SliceArgs) -> Result<(), PagingError> {
        let (start, stop, step) = args.normalize(self.len())?;

        if step == 1 {
            return self.update_pages(start as usize, stop.max(start) as usize, Vec::new());
        }
        if step == -1 {
            return self.update_pages(
                (stop + 1) as usize,
                (start.max(stop) + 1) as usize,
                Vec::new(),
            );
        }

        let count = span_len(start, stop, step);
        let mut targets: Vec<usize> = (0..count)
            .map(|i| (start + i as isize * step) as usize)
            .collect();
        if step > 0 {
            targets.reverse();
        }
        for index in targets {
            self.update_pages(index, index + 1, Vec::new())?;
        }
        Ok(())
    }

    /// Append another list's pages wholesale: O(pages), not O(elements).
    pub fn extend(&mut self, values: &PagingList) {
        let lengths: Vec<usize> = values.pages.iter().map(Page::len).collect();
        self.offsets.extend(&lengths);
        self.pages.extend(values.pages.iter().cloned());
    }

    /// Materialize an iterator into one new page and append it.
    pub fn extend_iterable<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let array: Vec<Value> = values.into_iter().collect();
        if array.is_empty() {
            return;
        }
        let page = Page::eager(array);
        self.offsets.extend(&[page.len()]);
        self.pages.push(page);
    }

    /// Append `count` null elements as one page.
    pub fn extend_nulls(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let page = Page::eager(vec![Value::Null; count]);
        self.offsets.extend(&[count]);
        self.pages.push(page);
    }
}

/// Page-by-page iterator over a [`PagingList`].
pub struct Iter<'a> {
    pages: &'a [Page],
    current: Option<(PageArray, usize)>,
    next_page: usize,
}

impl Iterator for Iter<'_> {
    type Item = Result<Value, PagingError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((array, index)) = &mut self.current {
                if *index < array.len() {
                    let value = array[*index].clone();
                    *index += 1;
                    return Some(Ok(value));
                }
                self.current = None;
            }

            let page = self.pages.get(self.next_page)?;
            self.next_page += 1;
            match page.as_array() {
                Ok(array) => self.current = Some((array, 0)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
