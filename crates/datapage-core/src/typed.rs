use datapage_common::{DataType, Value};

use crate::error::PagingError;
use crate::list::{Iter, PagingList};
use crate::page::Mapper;
use crate::span::SliceArgs;

/// A [`PagingList`] bound to a declared element type.
///
/// Values entering the list are checked against the type once, at the call
/// boundary; the inner list stores plain [`Value`]s. Two typed lists only
/// combine when their types are equal, and a rejected combination leaves
/// the receiver unchanged.
#[derive(Debug, Clone)]
pub struct TypedPagingList {
    list: PagingList,
    dtype: DataType,
}

impl TypedPagingList {
    pub fn new(dtype: DataType) -> Self {
        Self {
            list: PagingList::empty(),
            dtype,
        }
    }

    pub fn from_values(dtype: DataType, values: Vec<Value>) -> Result<Self, PagingError> {
        for value in &values {
            check_value(&dtype, value)?;
        }
        Ok(Self {
            list: PagingList::new(values),
            dtype,
        })
    }

    pub(crate) fn from_list(dtype: DataType, list: PagingList) -> Self {
        Self { list, dtype }
    }

    pub fn dtype(&self) -> &DataType {
        &self.dtype
    }

    pub fn as_list(&self) -> &PagingList {
        &self.list
    }

    pub fn into_inner(self) -> PagingList {
        self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn get(&self, index: isize) -> Result<Value, PagingError> {
        self.list.get(index)
    }

    pub fn iter(&self) -> Iter<'_> {
        self.list.iter()
    }

    pub fn to_contiguous_array(&self) -> Result<Vec<Value>, PagingError> {
        self.list.to_contiguous_array()
    }

    pub fn get_slice(&self, args: SliceArgs) -> Result<TypedPagingList, PagingError> {
        Ok(Self {
            list: self.list.get_slice(args)?,
            dtype: self.dtype.clone(),
        })
    }

    /// A copy whose elements are converted by `mapper` on read, typed as
    /// `dtype`. The mapper must produce values of the new type; they are
    /// not re-checked per element.
    pub fn map(&self, dtype: DataType, mapper: Mapper) -> TypedPagingList {
        Self {
            list: self.list.map(mapper),
            dtype,
        }
    }

    pub fn set(&mut self, index: isize, value: Value) -> Result<(), PagingError> {
        check_value(&self.dtype, &value)?;
        self.list.set(index, value)
    }

    pub fn set_slice(
        &mut self,
        args: SliceArgs,
        values: &TypedPagingList,
    ) -> Result<(), PagingError> {
        self.check_dtype(values)?;
        self.list.set_slice(args, &values.list)
    }

    pub fn set_slice_iterable<I>(&mut self, args: SliceArgs, values: I) -> Result<(), PagingError>
    where
        I: IntoIterator<Item = Value>,
    {
        let values: Vec<Value> = values.into_iter().collect();
        for value in &values {
            check_value(&self.dtype, value)?;
        }
        self.list.set_slice_iterable(args, values)
    }

    pub fn delete(&mut self, index: isize) -> Result<(), PagingError> {
        self.list.delete(index)
    }

    pub fn delete_slice(&mut self, args: SliceArgs) -> Result<(), PagingError> {
        self.list.delete_slice(args)
    }

    pub fn extend(&mut self, values: &TypedPagingList) -> Result<(), PagingError> {
        self.check_dtype(values)?;
        self.list.extend(&values.list);
        Ok(())
    }

    pub fn extend_iterable<I>(&mut self, values: I) -> Result<(), PagingError>
    where
        I: IntoIterator<Item = Value>,
    {
        let values: Vec<Value> = values.into_iter().collect();
        for value in &values {
            check_value(&self.dtype, value)?;
        }
        self.list.extend_iterable(values);
        Ok(())
    }

    pub fn extend_nulls(&mut self, count: usize) {
        self.list.extend_nulls(count);
    }

    fn check_dtype(&self, other: &TypedPagingList) -> Result<(), PagingError> {
        if self.dtype != other.dtype {
            return Err(PagingError::TypeMismatch {
                left: self.dtype.clone(),
                right: other.dtype.clone(),
            });
        }
        Ok(())
    }
}

fn check_value(dtype: &DataType, value: &Value) -> Result<(), PagingError> {
    if !dtype.is_compatible(value) {
        return Err(PagingError::TypeMismatch {
            left: dtype.clone(),
            right: value.data_type(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use datapage_common::IntoValue;

    fn ints(values: impl IntoIterator<Item = i64>) -> Vec<Value> {
        values.into_iter().map(IntoValue::into_value).collect()
    }

    #[test]
    fn values_checked_on_construction() {
        let list = TypedPagingList::from_values(DataType::Int, ints(0..3)).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.dtype(), &DataType::Int);

        let err = TypedPagingList::from_values(
            DataType::Int,
            vec![Value::Int(1), Value::Text("x".into())],
        );
        assert!(matches!(err, Err(PagingError::TypeMismatch { .. })));
    }

    #[test]
    fn nulls_fit_any_dtype() {
        let mut list =
            TypedPagingList::from_values(DataType::Text, vec![Value::Null, Value::Text("a".into())])
                .unwrap();
        list.set(0, Value::Null).unwrap();
        list.extend_iterable(vec![Value::Null]).unwrap();
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn mismatched_extend_leaves_receiver_unchanged() {
        let mut list = TypedPagingList::from_values(DataType::Int, ints(0..4)).unwrap();
        let other =
            TypedPagingList::from_values(DataType::Float, vec![Value::Float(1.5)]).unwrap();

        let err = list.extend(&other).unwrap_err();
        assert!(matches!(
            err,
            PagingError::TypeMismatch {
                left: DataType::Int,
                right: DataType::Float,
            }
        ));
        assert_eq!(list.to_contiguous_array().unwrap(), ints(0..4));
    }

    #[test]
    fn mismatched_set_slice_leaves_receiver_unchanged() {
        let mut list = TypedPagingList::from_values(DataType::Int, ints(0..4)).unwrap();
        let other =
            TypedPagingList::from_values(DataType::Text, vec![Value::Text("a".into())]).unwrap();

        assert!(list.set_slice(SliceArgs::range(1, 2), &other).is_err());
        assert_eq!(list.to_contiguous_array().unwrap(), ints(0..4));
    }

    #[test]
    fn slicing_preserves_dtype() {
        let list = TypedPagingList::from_values(DataType::Int, ints(0..6)).unwrap();
        let sliced = list.get_slice(SliceArgs::step(-2)).unwrap();
        assert_eq!(sliced.dtype(), &DataType::Int);
        assert_eq!(sliced.to_contiguous_array().unwrap(), ints([5, 3, 1]));
    }

    #[test]
    fn map_retypes_the_column() {
        use std::sync::Arc;

        let list = TypedPagingList::from_values(DataType::Int, ints(0..3)).unwrap();
        let labels = list.map(
            DataType::Text,
            Arc::new(|v| match v {
                Value::Int(i) => Value::Text(format!("#{i}")),
                other => other.clone(),
            }),
        );

        assert_eq!(labels.dtype(), &DataType::Text);
        assert_eq!(labels.get(1).unwrap(), Value::Text("#1".into()));
        assert_eq!(list.get(1).unwrap(), Value::Int(1));
    }

    #[test]
    fn extend_nulls_is_unchecked() {
        let mut list = TypedPagingList::new(DataType::Boolean);
        list.extend_nulls(2);
        assert_eq!(list.get(1).unwrap(), Value::Null);
    }
}
