use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use datapage_common::Value;

use crate::error::PagingError;
use crate::span::{SliceArgs, StridedSpan};

/// The materialized backing buffer of a page, shared by reference across
/// every list copy and sliced view that retains the page.
pub type PageArray = Arc<Vec<Value>>;

/// Produces the backing array of one lazy page. For factory-made pages
/// this closes over the factory's per-page cache, so invoking it twice
/// never repeats the remote fetch.
pub type ArrayFetcher = Arc<dyn Fn() -> Result<PageArray, PagingError> + Send + Sync>;

/// Converts one element when a mapped page is read or materialized.
pub type Mapper = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// A contiguous chunk of a paging list.
///
/// Variants form a closed set over the capability grid
/// {in memory, not yet fetched} x {whole, re-sliced}:
///
/// - `Eager`: an in-memory array.
/// - `Sliced`: a strided view into an in-memory array; the contiguous
///   copy is only built (and cached) on first `as_array`.
/// - `Lazy`: an unfetched page; the fetch result is cached in a cell
///   shared with every view sliced off this page.
/// - `LazySliced`: a strided view into an unfetched page; defers both the
///   fetch and the slicing.
/// - `Mapped`: any of the above plus a per-element conversion, applied
///   when the page is read; slicing a mapped page keeps the conversion
///   deferred.
///
/// Once materialized a page's array never changes; structural edits always
/// substitute whole new `Page` values in the owning list.
#[derive(Clone)]
pub enum Page {
    Eager(EagerPage),
    Sliced(SlicedPage),
    Lazy(LazyPage),
    LazySliced(LazySlicedPage),
    Mapped(MappedPage),
}

#[derive(Clone)]
pub struct EagerPage {
    array: PageArray,
}

#[derive(Clone)]
pub struct SlicedPage {
    span: StridedSpan,
    source: PageArray,
    contiguous: OnceCell<PageArray>,
}

#[derive(Clone)]
pub struct LazyPage {
    len: usize,
    fetcher: ArrayFetcher,
    cell: Arc<OnceCell<PageArray>>,
}

#[derive(Clone)]
pub struct LazySlicedPage {
    span: StridedSpan,
    source_len: usize,
    fetcher: ArrayFetcher,
    source_cell: Arc<OnceCell<PageArray>>,
    contiguous: OnceCell<PageArray>,
}

#[derive(Clone)]
pub struct MappedPage {
    source: Box<Page>,
    mapper: Mapper,
    contiguous: OnceCell<PageArray>,
}

impl Page {
    pub fn eager(values: Vec<Value>) -> Self {
        Page::Eager(EagerPage {
            array: Arc::new(values),
        })
    }

    pub fn from_array(array: PageArray) -> Self {
        Page::Eager(EagerPage { array })
    }

    /// An unfetched page of `len` elements.
    pub fn lazy(len: usize, fetcher: ArrayFetcher) -> Self {
        Page::Lazy(LazyPage {
            len,
            fetcher,
            cell: Arc::new(OnceCell::new()),
        })
    }

    /// Wrap this page so every element is converted by `mapper` on read.
    pub fn map(self, mapper: Mapper) -> Self {
        Page::Mapped(MappedPage {
            source: Box::new(self),
            mapper,
            contiguous: OnceCell::new(),
        })
    }

    pub fn len(&self) -> usize {
        match self {
            Page::Eager(p) => p.array.len(),
            Page::Sliced(p) => p.span.len(),
            Page::Lazy(p) => p.len,
            Page::LazySliced(p) => p.span.len(),
            Page::Mapped(p) => p.source.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at a page-local index, fetching the page if needed. Reads
    /// through the source array of sliced views without forcing their
    /// contiguous copy. `index` must be less than `len()`.
    pub fn get(&self, index: usize) -> Result<Value, PagingError> {
        match self {
            Page::Eager(p) => Ok(p.array[index].clone()),
            Page::Sliced(p) => Ok(p.source[p.span.get(index)].clone()),
            Page::Lazy(p) => Ok(p.fetch()?[index].clone()),
            Page::LazySliced(p) => {
                let source = p.fetch()?;
                Ok(source[p.span.get(index)].clone())
            }
            Page::Mapped(p) => Ok((p.mapper)(&p.source.get(index)?)),
        }
    }

    /// The materialized contiguous array of this page, fetched and cached
    /// at most once. A failed fetch leaves the cache slot unset so a later
    /// access can retry.
    pub fn as_array(&self) -> Result<PageArray, PagingError> {
        match self {
            Page::Eager(p) => Ok(p.array.clone()),
            Page::Sliced(p) => p
                .contiguous
                .get_or_try_init(|| Ok(apply_span(&p.span, &p.source)))
                .cloned(),
            Page::Lazy(p) => p.fetch(),
            Page::LazySliced(p) => p
                .contiguous
                .get_or_try_init(|| {
                    let source = p.fetch()?;
                    Ok(apply_span(&p.span, &source))
                })
                .cloned(),
            Page::Mapped(p) => p
                .contiguous
                .get_or_try_init(|| {
                    let source = p.source.as_array()?;
                    Ok(Arc::new(source.iter().map(|v| (p.mapper)(v)).collect()))
                })
                .cloned(),
        }
    }

    /// A sliced view of this page. Never fetches; slicing an unfetched
    /// page yields a view bound to the same cache cell, so the eventual
    /// fetch is still performed once and shared.
    pub fn get_slice(&self, args: SliceArgs) -> Result<Page, PagingError> {
        match self {
            Page::Eager(p) => Ok(Page::Sliced(SlicedPage {
                span: StridedSpan::from_args(args, p.array.len())?,
                source: p.array.clone(),
                contiguous: OnceCell::new(),
            })),
            Page::Sliced(p) => Ok(Page::Sliced(SlicedPage {
                span: p.span.slice(args)?,
                source: p.source.clone(),
                contiguous: OnceCell::new(),
            })),
            Page::Lazy(p) => Ok(Page::LazySliced(LazySlicedPage {
                span: StridedSpan::from_args(args, p.len)?,
                source_len: p.len,
                fetcher: p.fetcher.clone(),
                source_cell: p.cell.clone(),
                contiguous: OnceCell::new(),
            })),
            Page::LazySliced(p) => Ok(Page::LazySliced(LazySlicedPage {
                span: p.span.slice(args)?,
                source_len: p.source_len,
                fetcher: p.fetcher.clone(),
                source_cell: p.source_cell.clone(),
                contiguous: OnceCell::new(),
            })),
            Page::Mapped(p) => Ok(Page::Mapped(MappedPage {
                source: Box::new(p.source.get_slice(args)?),
                mapper: p.mapper.clone(),
                contiguous: OnceCell::new(),
            })),
        }
    }
}

// A fetcher returning an array shorter than the declared page length
// would make the page-local indices derived from `Offsets` dangle, so
// both lazy variants reject it before caching.
fn checked_fetch(fetcher: &ArrayFetcher, expected: usize) -> Result<PageArray, PagingError> {
    let array = fetcher()?;
    if array.len() != expected {
        return Err(PagingError::LengthMismatch {
            expected,
            got: array.len(),
        });
    }
    Ok(array)
}

impl LazyPage {
    fn fetch(&self) -> Result<PageArray, PagingError> {
        self.cell
            .get_or_try_init(|| {
                #[cfg(feature = "tracing")]
                tracing::debug!(len = self.len, "materializing lazy page");
                checked_fetch(&self.fetcher, self.len)
            })
            .cloned()
    }
}

impl LazySlicedPage {
    fn fetch(&self) -> Result<PageArray, PagingError> {
        self.source_cell
            .get_or_try_init(|| {
                #[cfg(feature = "tracing")]
                tracing::debug!(len = self.span.len(), "materializing lazy sliced page");
                checked_fetch(&self.fetcher, self.source_len)
            })
            .cloned()
    }
}

fn apply_span(span: &StridedSpan, source: &PageArray) -> PageArray {
    Arc::new(span.iter().map(|i| source[i].clone()).collect())
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Page::Eager(_) => "Eager",
            Page::Sliced(_) => "Sliced",
            Page::Lazy(_) => "Lazy",
            Page::LazySliced(_) => "LazySliced",
            Page::Mapped(_) => "Mapped",
        };
        write!(f, "{name}({})", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datapage_common::IntoValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ints(values: impl IntoIterator<Item = i64>) -> Vec<Value> {
        values.into_iter().map(IntoValue::into_value).collect()
    }

    fn counting_fetcher(values: Vec<Value>, calls: Arc<AtomicUsize>) -> ArrayFetcher {
        Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(values.clone()))
        })
    }

    #[test]
    fn eager_roundtrip() {
        let page = Page::eager(ints(0..5));
        assert_eq!(page.len(), 5);
        assert_eq!(page.get(3).unwrap(), Value::Int(3));
        assert_eq!(*page.as_array().unwrap(), ints(0..5));
    }

    #[test]
    fn sliced_view_shares_source_until_materialized() {
        let page = Page::eager(ints(0..10));
        let sliced = page.get_slice(SliceArgs::new(1, 8, 2)).unwrap();
        assert_eq!(sliced.len(), 4);
        assert_eq!(sliced.get(1).unwrap(), Value::Int(3));
        assert_eq!(*sliced.as_array().unwrap(), ints([1, 3, 5, 7]));

        let reversed = sliced.get_slice(SliceArgs::step(-1)).unwrap();
        assert_eq!(*reversed.as_array().unwrap(), ints([7, 5, 3, 1]));
    }

    #[test]
    fn lazy_fetches_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = Page::lazy(5, counting_fetcher(ints(0..5), calls.clone()));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(page.get(2).unwrap(), Value::Int(2));
        assert_eq!(*page.as_array().unwrap(), ints(0..5));
        assert_eq!(page.get(4).unwrap(), Value::Int(4));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lazy_slice_shares_fetch_with_parent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = Page::lazy(10, counting_fetcher(ints(0..10), calls.clone()));

        let head = page.get_slice(SliceArgs::range(0, 3)).unwrap();
        let tail = page.get_slice(SliceArgs::new(7, None, None)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(*head.as_array().unwrap(), ints(0..3));
        assert_eq!(*tail.as_array().unwrap(), ints(7..10));
        assert_eq!(*page.as_array().unwrap(), ints(0..10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_fetch_is_retryable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = calls.clone();
        let fetcher: ArrayFetcher = Arc::new(move || {
            let n = inner.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(PagingError::Fetch(datapage_common::FetchError::new(
                    "transient",
                )))
            } else {
                Ok(Arc::new(vec![Value::Int(1), Value::Int(2)]))
            }
        });
        let page = Page::lazy(2, fetcher);

        assert!(page.as_array().is_err());
        assert_eq!(*page.as_array().unwrap(), vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn short_fetch_is_an_error_not_a_panic() {
        let fetcher: ArrayFetcher = Arc::new(|| Ok(Arc::new(ints(0..3))));
        let page = Page::lazy(5, fetcher);

        assert!(matches!(
            page.get(4),
            Err(PagingError::LengthMismatch {
                expected: 5,
                got: 3
            })
        ));
        assert!(page.as_array().is_err());

        // Sliced views validate against the declared source length too.
        let sliced = page.get_slice(SliceArgs::range(3, 5)).unwrap();
        assert!(matches!(
            sliced.as_array(),
            Err(PagingError::LengthMismatch { expected: 5, .. })
        ));
    }

    #[test]
    fn mapped_pages_convert_on_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = calls.clone();
        let double: Mapper = Arc::new(move |v| {
            inner.fetch_add(1, Ordering::SeqCst);
            match v {
                Value::Int(i) => Value::Int(i * 2),
                other => other.clone(),
            }
        });

        let page = Page::eager(ints(0..5)).map(double);
        assert_eq!(page.len(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(page.get(3).unwrap(), Value::Int(6));
        assert_eq!(*page.as_array().unwrap(), ints([0, 2, 4, 6, 8]));
        // Materialization is cached; a second read maps nothing.
        let before = calls.load(Ordering::SeqCst);
        page.as_array().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), before);
    }

    #[test]
    fn slicing_a_mapped_lazy_page_defers_both() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let page = Page::lazy(10, counting_fetcher(ints(0..10), fetches.clone()));
        let negate: Mapper = Arc::new(|v| match v {
            Value::Int(i) => Value::Int(-i),
            other => other.clone(),
        });

        let mapped = page.clone().map(negate);
        let window = mapped.get_slice(SliceArgs::new(1, 8, 2)).unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 0);

        assert_eq!(*window.as_array().unwrap(), ints([-1, -3, -5, -7]));
        // The fetch is still shared with the unmapped parent.
        assert_eq!(*page.as_array().unwrap(), ints(0..10));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clone_shares_materialization() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = Page::lazy(3, counting_fetcher(ints(0..3), calls.clone()));
        let copy = page.clone();

        page.as_array().unwrap();
        copy.as_array().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
