use std::ops::Range;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use datapage_common::{DataType, FetchError, FieldPath, Value};

use crate::error::PagingError;
use crate::list::PagingList;
use crate::offset::Offsets;
use crate::page::{Page, PageArray};
use crate::typed::TypedPagingList;

/// Fetches one page of records. Called with the global offset of the first
/// record and the number of records to return.
pub type Fetcher = Arc<dyn Fn(usize, usize) -> Result<Vec<Value>, FetchError> + Send + Sync>;

struct FactoryInner {
    total_count: usize,
    limit: usize,
    dtype: DataType,
    fetcher: Fetcher,
    pages: Vec<OnceCell<PageArray>>,
}

/// A shared source of lazy pages over a remote record set.
///
/// The factory fetches whole record pages and caches each page exactly
/// once; every column list created from it extracts its field from the
/// same cached records, so reading N columns still costs one fetch per
/// page. Cloning the factory clones the handle, not the cache.
#[derive(Clone)]
pub struct LazyFactory {
    inner: Arc<FactoryInner>,
}

impl LazyFactory {
    pub fn new(
        total_count: usize,
        limit: usize,
        dtype: DataType,
        fetcher: Fetcher,
    ) -> Result<Self, PagingError> {
        if limit == 0 && total_count != 0 {
            return Err(PagingError::InvalidLimit { limit, total_count });
        }
        let page_count = if total_count == 0 {
            0
        } else {
            total_count.div_ceil(limit)
        };
        Ok(Self {
            inner: Arc::new(FactoryInner {
                total_count,
                limit,
                dtype,
                fetcher,
                pages: (0..page_count).map(|_| OnceCell::new()).collect(),
            }),
        })
    }

    pub fn total_count(&self) -> usize {
        self.inner.total_count
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    pub fn page_count(&self) -> usize {
        self.inner.pages.len()
    }

    pub fn dtype(&self) -> &DataType {
        &self.inner.dtype
    }

    /// The global record range covered by each page, in order.
    pub fn get_page_ranges(&self) -> impl Iterator<Item = Range<usize>> + use<> {
        let limit = self.inner.limit;
        let total = self.inner.total_count;
        (0..self.page_count()).map(move |i| {
            let start = i * limit;
            start..(start + limit).min(total)
        })
    }

    pub fn page_lengths(&self) -> impl Iterator<Item = usize> + use<> {
        self.get_page_ranges().map(|r| r.len())
    }

    pub(crate) fn offsets(&self) -> Offsets {
        Offsets::new(self.inner.total_count, self.inner.limit)
    }

    /// The records of page `pos`, fetched and cached at most once. A failed
    /// fetch leaves the slot unset so a later access can retry.
    fn fetch_page(&self, pos: usize) -> Result<PageArray, PagingError> {
        let inner = &self.inner;
        inner.pages[pos]
            .get_or_try_init(|| {
                let offset = pos * inner.limit;
                let count = inner.limit.min(inner.total_count - offset);
                #[cfg(feature = "tracing")]
                tracing::debug!(pos, offset, count, "fetching page");
                let records = (inner.fetcher)(offset, count)?;
                if records.len() != count {
                    return Err(PagingError::LengthMismatch {
                        expected: count,
                        got: records.len(),
                    });
                }
                Ok(Arc::new(records))
            })
            .cloned()
    }

    /// The column at `path` of page `pos`. The underlying record page is
    /// shared with every other column of the same page.
    pub fn get_array(&self, pos: usize, path: &FieldPath) -> Result<PageArray, PagingError> {
        self.column(pos, path, false)
    }

    /// With `fold_case` set, record fields are matched ignoring ASCII case;
    /// remote sheets may store field names lower-cased regardless of the
    /// schema's spelling.
    fn column(
        &self,
        pos: usize,
        path: &FieldPath,
        fold_case: bool,
    ) -> Result<PageArray, PagingError> {
        let records = self.fetch_page(pos)?;
        if path.is_root() {
            return Ok(records);
        }

        let mut out = Vec::with_capacity(records.len());
        'records: for record in records.iter() {
            let mut current = record;
            for segment in path.segments() {
                let next = if fold_case {
                    current.field_ignore_case(segment)
                } else {
                    current.field(segment)
                };
                // Null records and sparse structs contribute nulls rather
                // than failing the whole page.
                match next {
                    Some(value) => current = value,
                    None => {
                        out.push(Value::Null);
                        continue 'records;
                    }
                }
            }
            out.push(current.clone());
        }
        Ok(Arc::new(out))
    }

    /// The root factory view, for walking into nested fields.
    pub fn root(&self) -> LazySubFactory {
        LazySubFactory {
            factory: self.clone(),
            path: FieldPath::root(),
            dtype: self.inner.dtype.clone(),
            fold_case: false,
        }
    }

    pub fn field(&self, name: &str) -> Result<LazySubFactory, PagingError> {
        self.root().field(name)
    }

    /// A typed list over whole records.
    pub fn create_list(&self) -> TypedPagingList {
        self.make_list(&FieldPath::root(), self.inner.dtype.clone(), false)
    }

    /// A typed list over the column at `path`.
    pub fn create_list_at(&self, path: &FieldPath) -> Result<TypedPagingList, PagingError> {
        let mut sub = self.root();
        for segment in path.segments() {
            sub = sub.field(segment)?;
        }
        Ok(sub.create_list())
    }

    fn make_list(&self, path: &FieldPath, dtype: DataType, fold_case: bool) -> TypedPagingList {
        let pages: Vec<Page> = self
            .page_lengths()
            .enumerate()
            .map(|(pos, len)| {
                let factory = self.clone();
                let path = path.clone();
                Page::lazy(len, Arc::new(move || factory.column(pos, &path, fold_case)))
            })
            .collect();
        TypedPagingList::from_list(dtype, PagingList::from_pages(pages, self.offsets()))
    }
}

impl std::fmt::Debug for LazyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyFactory")
            .field("total_count", &self.inner.total_count)
            .field("limit", &self.inner.limit)
            .field("dtype", &self.inner.dtype)
            .finish_non_exhaustive()
    }
}

/// A factory view rooted at a field path inside the record type.
#[derive(Debug, Clone)]
pub struct LazySubFactory {
    factory: LazyFactory,
    path: FieldPath,
    dtype: DataType,
    fold_case: bool,
}

impl LazySubFactory {
    pub fn dtype(&self) -> &DataType {
        &self.dtype
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Walk one level deeper. Only struct types have fields.
    pub fn field(&self, name: &str) -> Result<LazySubFactory, PagingError> {
        let field = self
            .dtype
            .field(name)
            .ok_or_else(|| PagingError::UnknownField {
                name: name.to_owned(),
            })?;
        Ok(LazySubFactory {
            factory: self.factory.clone(),
            path: self.path.child(&field.name),
            dtype: field.dtype.clone(),
            fold_case: self.fold_case,
        })
    }

    /// Extraction through this view matches remote field names ignoring
    /// ASCII case instead of exactly.
    pub(crate) fn fold_remote_case(mut self) -> Self {
        self.fold_case = true;
        self
    }

    /// A typed list over this view's column.
    pub fn create_list(&self) -> TypedPagingList {
        self.factory
            .make_list(&self.path, self.dtype.clone(), self.fold_case)
    }
}
