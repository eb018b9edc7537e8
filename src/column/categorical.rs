//! Packed-categorical columns: a dictionary-backed category value stored as
//! a packed integer index at one of widths `{2, 4, 8, 16, 32}`.

use std::any::Any;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::packed;

use super::{Column, ObjectValue, TypeDescriptor, ValueClass};

/// Backing storage for a frozen categorical column's indices, one variant
/// per supported bit width.
#[derive(Debug)]
pub enum CategoricalPayload {
    /// 2-bit packed lanes, up to 3 non-null categories.
    W2(Vec<u8>, usize),
    /// 4-bit packed lanes, up to 15 non-null categories.
    W4(Vec<u8>, usize),
    /// 8-bit lanes, up to 255 non-null categories.
    W8(Vec<u8>),
    /// 16-bit lanes, up to 65535 non-null categories.
    W16(Vec<u16>),
    /// 32-bit lanes, up to `i32::MAX` non-null categories.
    W32(Vec<i32>),
}

impl CategoricalPayload {
    /// The lane width in bits.
    pub fn width(&self) -> u8 {
        match self {
            CategoricalPayload::W2(..) => 2,
            CategoricalPayload::W4(..) => 4,
            CategoricalPayload::W8(_) => 8,
            CategoricalPayload::W16(_) => 16,
            CategoricalPayload::W32(_) => 32,
        }
    }

    /// Number of logical lanes (rows).
    pub fn len(&self) -> usize {
        match self {
            CategoricalPayload::W2(_, n) => *n,
            CategoricalPayload::W4(_, n) => *n,
            CategoricalPayload::W8(v) => v.len(),
            CategoricalPayload::W16(v) => v.len(),
            CategoricalPayload::W32(v) => v.len(),
        }
    }

    /// True if there are no lanes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the dictionary index at lane `i` (0 = null).
    pub fn get(&self, i: usize) -> u32 {
        match self {
            CategoricalPayload::W2(buf, _) => packed::read2(buf, i) as u32,
            CategoricalPayload::W4(buf, _) => packed::read4(buf, i) as u32,
            CategoricalPayload::W8(v) => v[i] as u32,
            CategoricalPayload::W16(v) => v[i] as u32,
            CategoricalPayload::W32(v) => v[i] as u32,
        }
    }
}

/// A frozen, dictionary-backed categorical column.
#[derive(Debug)]
pub struct CategoricalColumn {
    ty: TypeDescriptor,
    payload: CategoricalPayload,
    dict: Arc<Dictionary<String>>,
    /// For boolean-declared columns, the dictionary index (1 or 2) treated
    /// as the positive class.
    positive_index: Option<u32>,
}

impl CategoricalColumn {
    /// Builds a non-boolean categorical column.
    pub fn new(type_id: u32, payload: CategoricalPayload, dict: Arc<Dictionary<String>>) -> Self {
        Self {
            ty: TypeDescriptor::new(type_id, ValueClass::Categorical),
            payload,
            dict,
            positive_index: None,
        }
    }

    /// Builds a boolean-declared categorical column.
    ///
    /// Fails with [`Error::NotBoolean`] unless the dictionary has at most
    /// two non-null entries and `positive_value` matches one of them (or is
    /// the column's only entry).
    pub fn new_boolean(
        type_id: u32,
        payload: CategoricalPayload,
        dict: Arc<Dictionary<String>>,
        positive_value: &str,
    ) -> Result<Self> {
        if dict.len() > 2 {
            return Err(Error::NotBoolean(format!(
                "dictionary has {} non-null entries, boolean columns allow at most 2",
                dict.len()
            )));
        }
        let positive_index = dict.index_of(&positive_value.to_string()).or_else(|| {
            if dict.len() == 1 {
                Some(1)
            } else {
                None
            }
        });
        let positive_index = positive_index.ok_or_else(|| {
            Error::NotBoolean(format!("positive value {positive_value:?} is not in the dictionary"))
        })?;
        Ok(Self {
            ty: TypeDescriptor::boolean(type_id),
            payload,
            dict,
            positive_index: Some(positive_index),
        })
    }

    /// The backing dictionary.
    pub fn dictionary(&self) -> &Arc<Dictionary<String>> {
        &self.dict
    }

    /// The dictionary index treated as the positive class, for boolean-
    /// declared columns, for the binary format writer.
    pub fn positive_index(&self) -> Option<u32> {
        self.positive_index
    }

    /// The index width in bits.
    pub fn index_format(&self) -> u8 {
        self.payload.width()
    }

    fn index_at(&self, row: i64) -> Option<u32> {
        if row < 0 || row as usize >= self.payload.len() {
            return None;
        }
        let idx = self.payload.get(row as usize);
        if idx == 0 {
            None
        } else {
            Some(idx)
        }
    }

    /// Boolean view: does logical row `row` hold the positive class?
    ///
    /// Returns `None` if the row is missing, or if this column is not
    /// declared boolean.
    pub fn boolean_at(&self, row: i64) -> Option<bool> {
        let positive = self.positive_index?;
        let idx = self.index_at(row)?;
        Some(idx == positive)
    }

    /// Boolean view by dictionary index: fails with [`Error::NotBoolean`]
    /// if this column is not declared boolean.
    pub fn boolean_of_index(&self, index: u32) -> Result<bool> {
        let positive = self.positive_index.ok_or_else(|| {
            Error::NotBoolean("column is not declared boolean".to_string())
        })?;
        Ok(index == positive)
    }

    /// Boolean view by rounded floating-point dictionary index.
    pub fn boolean_of_f64(&self, value: f64) -> Result<bool> {
        if value.is_nan() || value < 0.0 {
            return Err(Error::NotBoolean(format!("{value} is not a valid dictionary index")));
        }
        self.boolean_of_index(value.round() as u32)
    }

    /// Boolean view by category string: fails with [`Error::NotBoolean`] if
    /// the string is not in the dictionary or this column is not declared
    /// boolean.
    pub fn boolean_of_str(&self, value: &str) -> Result<bool> {
        let positive = self.positive_index.ok_or_else(|| {
            Error::NotBoolean("column is not declared boolean".to_string())
        })?;
        let idx = self
            .dict
            .index_of(&value.to_string())
            .ok_or_else(|| Error::NotBoolean(format!("{value:?} is not in the dictionary")))?;
        Ok(idx == positive)
    }
}

impl Column for CategoricalColumn {
    fn size(&self) -> usize {
        self.payload.len()
    }

    fn column_type(&self) -> &TypeDescriptor {
        &self.ty
    }

    fn fill_f64(&self, dst: &mut [f64], start_row: i64) {
        for (k, slot) in dst.iter_mut().enumerate() {
            *slot = match self.index_at(start_row + k as i64) {
                Some(idx) => idx as f64,
                None => 0.0,
            };
        }
    }

    fn get_object(&self, row: i64) -> Option<ObjectValue> {
        let idx = self.index_at(row)?;
        self.dict.get(idx).map(ObjectValue::Str)
    }

    fn get_index(&self, row: i64) -> Option<u32> {
        Some(self.index_at(row).unwrap_or(0))
    }

    fn fill_indices(&self, dst: &mut [i32], start_row: i64) {
        for (k, slot) in dst.iter_mut().enumerate() {
            *slot = self.index_at(start_row + k as i64).unwrap_or(0) as i32;
        }
    }

    fn is_missing(&self, row: i64) -> bool {
        self.index_at(row).is_none()
    }

    fn compare_rows(&self, a: i64, b: i64) -> Option<Ordering> {
        if self.dict.comparator().is_none() {
            return None;
        }
        let va = self.index_at(a).and_then(|i| self.dict.get(i));
        let vb = self.index_at(b).and_then(|i| self.dict.get(i));
        self.dict.compare(va.as_ref(), vb.as_ref())
    }

    fn supports_sort(&self) -> bool {
        self.dict.comparator().is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
