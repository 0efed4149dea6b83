use rustc_hash::FxHashMap;

use datapage_common::DataType;

use crate::error::PagingError;
use crate::factory::{LazyFactory, LazySubFactory};
use crate::typed::TypedPagingList;

/// A factory view that resolves field names without regard to ASCII case.
///
/// Remote sheets are inconsistent about casing ("remotePath" vs
/// "remotepath"), in two directions: callers may spell a schema field
/// differently, and fetched records may carry lower-cased names the schema
/// spells mixed-case. Each level keeps a lowercased-name index over its
/// struct fields for the caller side, and lists created through this view
/// extract record fields ignoring case as well. An exact match always
/// wins; otherwise the first case-insensitive match in schema order is
/// used.
#[derive(Debug, Clone)]
pub struct CaseInsensitiveFactory {
    inner: LazySubFactory,
    lookup: FxHashMap<String, String>,
}

impl CaseInsensitiveFactory {
    pub fn new(factory: &LazyFactory) -> Self {
        Self::from_sub(factory.root())
    }

    fn from_sub(inner: LazySubFactory) -> Self {
        let inner = inner.fold_remote_case();
        let mut lookup = FxHashMap::default();
        if let DataType::Struct(fields) = inner.dtype() {
            for field in fields {
                // First match in schema order wins on collision.
                lookup
                    .entry(field.name.to_ascii_lowercase())
                    .or_insert_with(|| field.name.clone());
            }
        }
        Self { inner, lookup }
    }

    pub fn dtype(&self) -> &DataType {
        self.inner.dtype()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Canonical schema names of this level's fields, in schema order.
    pub fn field_names(&self) -> Vec<&str> {
        match self.inner.dtype() {
            DataType::Struct(fields) => fields.iter().map(|f| f.name.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.inner.dtype().field(name).is_some() {
            return Some(name);
        }
        self.lookup
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn field(&self, name: &str) -> Result<CaseInsensitiveFactory, PagingError> {
        let canonical = self.resolve(name).ok_or_else(|| PagingError::UnknownField {
            name: name.to_owned(),
        })?;
        Ok(Self::from_sub(self.inner.field(canonical)?))
    }

    pub fn create_list(&self) -> TypedPagingList {
        self.inner.create_list()
    }
}
