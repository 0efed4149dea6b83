//! Lazy paged columnar lists.
//!
//! A [`PagingList`] holds its elements in ordered pages; pages may be plain
//! in-memory arrays, strided views over other pages, or lazy handles whose
//! backing array is fetched on first touch and cached. A [`LazyFactory`]
//! produces column lists over a remote record set, sharing one record
//! fetch per page across every column.

pub mod error;
pub mod factory;
pub mod list;
pub mod offset;
pub mod page;
pub mod span;
pub mod typed;
pub mod wrapper;

pub use error::PagingError;
pub use factory::{Fetcher, LazyFactory, LazySubFactory};
pub use list::PagingList;
pub use offset::Offsets;
pub use page::{ArrayFetcher, Mapper, Page, PageArray};
pub use span::{SliceArgs, StridedSpan};
pub use typed::TypedPagingList;
pub use wrapper::CaseInsensitiveFactory;

pub use datapage_common::{DataType, FetchError, Field, FieldPath, IntoValue, Value};
