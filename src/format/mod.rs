//! Binary on-disk table format.
//!
//! Layout, in order: a 16-byte header, a type table (one 8-byte record per
//! column), a name region (a length table followed by concatenated UTF-8
//! column names), then one payload per column in declared order. Multi-byte
//! integers and floats are big-endian throughout.
//!
//! [`store`] and [`load`] never hold the whole file open across a single
//! syscall: the in-memory [`bytes::BytesMut`]/`Vec<u8>` is flushed to (or
//! filled from) disk in `block_limit`-sized chunks.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use bytes::{Buf, BufMut, BytesMut};
use tracing::instrument;

use crate::column::categorical::{CategoricalColumn, CategoricalPayload};
use crate::column::datetime::{DateTimeColumn, MISSING_SECONDS};
use crate::column::dense::DenseDoubleColumn;
use crate::column::object::ObjectColumn;
use crate::column::time::TimeColumn;
use crate::column::{Column, ColumnRef, ObjectValue, TypeDescriptor, ValueClass};
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::table::Table;

/// Magic bytes opening every file this format writes.
pub const MAGIC: [u8; 4] = [0x42, 0x4C, 0x54, 0x00];
/// Format major version this crate writes and the newest it reads.
pub const VERSION_MAJOR: u8 = 1;
/// Format minor version this crate writes.
pub const VERSION_MINOR: u8 = 0;
/// Default chunk size used by [`store`]/[`load`] when the caller has no
/// opinion on it.
pub const DEFAULT_BLOCK_LIMIT: usize = 1 << 20;

fn value_class_tag(vc: ValueClass) -> u8 {
    match vc {
        ValueClass::Real => 0,
        ValueClass::Integer => 1,
        ValueClass::Categorical => 2,
        ValueClass::Object => 3,
        ValueClass::DateTime => 4,
        ValueClass::Time => 5,
    }
}

fn value_class_from_tag(tag: u8) -> Result<ValueClass> {
    Ok(match tag {
        0 => ValueClass::Real,
        1 => ValueClass::Integer,
        2 => ValueClass::Categorical,
        3 => ValueClass::Object,
        4 => ValueClass::DateTime,
        5 => ValueClass::Time,
        other => return Err(Error::DomainViolation(format!("unknown value class tag {other}"))),
    })
}

fn need(buf: &[u8], n: usize) -> Result<()> {
    if buf.len() < n {
        Err(Error::Truncated { expected: n, found: buf.len() })
    } else {
        Ok(())
    }
}

fn read_u8(buf: &mut &[u8]) -> Result<u8> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}

fn read_u32(buf: &mut &[u8]) -> Result<u32> {
    need(buf, 4)?;
    Ok(buf.get_u32())
}

fn read_i64(buf: &mut &[u8]) -> Result<i64> {
    need(buf, 8)?;
    Ok(buf.get_i64())
}

fn read_u64(buf: &mut &[u8]) -> Result<u64> {
    need(buf, 8)?;
    Ok(buf.get_u64())
}

fn read_f64(buf: &mut &[u8]) -> Result<f64> {
    need(buf, 8)?;
    Ok(buf.get_f64())
}

fn read_string(buf: &mut &[u8]) -> Result<String> {
    let len = read_u32(buf)? as usize;
    need(buf, len)?;
    let bytes = buf[..len].to_vec();
    buf.advance(len);
    String::from_utf8(bytes).map_err(|e| Error::DomainViolation(format!("invalid UTF-8 in name/value: {e}")))
}

fn write_string(out: &mut BytesMut, s: &str) {
    out.put_u32(s.len() as u32);
    out.put_slice(s.as_bytes());
}

/// Writes `table` to `path` using the default block limit. See
/// [`store_with_block_limit`] to control chunk size.
pub fn store(table: &Table, path: &Path) -> Result<()> {
    store_with_block_limit(table, path, DEFAULT_BLOCK_LIMIT)
}

/// Writes `table` to `path`, flushing the in-memory buffer to disk in
/// `block_limit`-byte chunks.
#[instrument(skip(table), fields(width = table.width(), height = table.height()))]
pub fn store_with_block_limit(table: &Table, path: &Path, block_limit: usize) -> Result<()> {
    let mut out = BytesMut::with_capacity(4096);
    write_header(&mut out, table.width() as u32, table.height() as u32);
    for col in table.columns() {
        write_type_record(&mut out, col.column_type(), categorical_width(col));
    }
    write_name_region(&mut out, table.labels());
    for col in table.columns() {
        write_payload(&mut out, col, table.height());
    }

    let mut file = File::create(path)?;
    let bytes = out.freeze();
    let mut written = 0usize;
    while written < bytes.len() {
        let end = (written + block_limit).min(bytes.len());
        file.write_all(&bytes[written..end])?;
        written = end;
    }
    file.flush()?;
    Ok(())
}

/// Reads a [`Table`] from `path` using the default block limit. See
/// [`load_with_block_limit`] to control chunk size.
pub fn load(path: &Path) -> Result<Table> {
    load_with_block_limit(path, DEFAULT_BLOCK_LIMIT)
}

/// Reads a [`Table`] from `path`, filling the in-memory buffer from disk in
/// `block_limit`-byte chunks before parsing.
#[instrument(skip_all)]
pub fn load_with_block_limit(path: &Path, block_limit: usize) -> Result<Table> {
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    let mut chunk = vec![0u8; block_limit];
    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
    }

    let mut cursor: &[u8] = &data;
    let (width, height) = read_header(&mut cursor)?;
    let mut descriptors = Vec::with_capacity(width);
    let mut cat_widths = Vec::with_capacity(width);
    for _ in 0..width {
        let (ty, cat_width) = read_type_record(&mut cursor)?;
        descriptors.push(ty);
        cat_widths.push(cat_width);
    }
    let labels = read_name_region(&mut cursor, width)?;
    let mut columns = Vec::with_capacity(width);
    for (ty, cat_width) in descriptors.into_iter().zip(cat_widths) {
        columns.push(read_payload(&mut cursor, &ty, cat_width, height)?);
    }
    Table::new(columns, labels)
}

fn categorical_width(col: &ColumnRef) -> u8 {
    col.as_any()
        .downcast_ref::<CategoricalColumn>()
        .map(|c| c.index_format())
        .unwrap_or(0)
}

fn write_header(out: &mut BytesMut, width: u32, height: u32) {
    out.put_slice(&MAGIC);
    out.put_u8(VERSION_MAJOR);
    out.put_u8(VERSION_MINOR);
    out.put_u16(0); // reserved
    out.put_u32(width);
    out.put_u32(height);
}

fn read_header(buf: &mut &[u8]) -> Result<(usize, usize)> {
    need(buf, 16)?;
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&buf[..4]);
    buf.advance(4);
    if magic != MAGIC {
        return Err(Error::InvalidMagic);
    }
    let major = read_u8(buf)?;
    let minor = read_u8(buf)?;
    if major != VERSION_MAJOR {
        return Err(Error::IncompatibleVersion { major, minor });
    }
    let _reserved = read_u8(buf)?;
    let _reserved = read_u8(buf)?;
    let raw_width = read_u32(buf)?;
    let raw_height = read_u32(buf)?;
    if raw_width & 0x8000_0000 != 0 {
        return Err(Error::DomainViolation(format!("negative width ({raw_width} as i32)")));
    }
    if raw_height & 0x8000_0000 != 0 {
        return Err(Error::DomainViolation(format!("negative height ({raw_height} as i32)")));
    }
    Ok((raw_width as usize, raw_height as usize))
}

fn write_type_record(out: &mut BytesMut, ty: &TypeDescriptor, cat_width: u8) {
    out.put_u32(ty.id);
    out.put_u8(value_class_tag(ty.value_class));
    out.put_u8(ty.is_boolean as u8);
    out.put_u8(cat_width);
    out.put_u8(0); // reserved
}

fn read_type_record(buf: &mut &[u8]) -> Result<(TypeDescriptor, u8)> {
    let id = read_u32(buf)?;
    let value_class = value_class_from_tag(read_u8(buf)?)?;
    let is_boolean = read_u8(buf)? != 0;
    let cat_width = read_u8(buf)?;
    let _reserved = read_u8(buf)?;
    Ok((TypeDescriptor { id, value_class, is_boolean }, cat_width))
}

fn write_name_region(out: &mut BytesMut, labels: &[String]) {
    for label in labels {
        out.put_u32(label.len() as u32);
    }
    for label in labels {
        out.put_slice(label.as_bytes());
    }
}

fn read_name_region(buf: &mut &[u8], width: usize) -> Result<Vec<String>> {
    let mut lens = Vec::with_capacity(width);
    for _ in 0..width {
        lens.push(read_u32(buf)? as usize);
    }
    let mut labels = Vec::with_capacity(width);
    for len in lens {
        need(buf, len)?;
        let bytes = buf[..len].to_vec();
        buf.advance(len);
        labels.push(
            String::from_utf8(bytes)
                .map_err(|e| Error::DomainViolation(format!("invalid UTF-8 column name: {e}")))?,
        );
    }
    Ok(labels)
}

fn write_payload(out: &mut BytesMut, col: &ColumnRef, height: usize) {
    match col.column_type().value_class {
        ValueClass::Real | ValueClass::Integer => {
            let mut row = [0.0f64; 1];
            for i in 0..height {
                col.fill_f64(&mut row, i as i64);
                out.put_f64(row[0]);
            }
        }
        ValueClass::Categorical => write_categorical_payload(out, col),
        ValueClass::DateTime => write_datetime_payload(out, col, height),
        ValueClass::Time => write_time_payload(out, col, height),
        ValueClass::Object => write_object_payload(out, col, height),
    }
}

fn write_categorical_payload(out: &mut BytesMut, col: &ColumnRef) {
    let cat = col
        .as_any()
        .downcast_ref::<CategoricalColumn>()
        .expect("categorical value class implies CategoricalColumn");
    out.put_u32(cat.positive_index().unwrap_or(0));

    let width = cat.index_format();
    out.put_u8(width);
    let height = cat.size();
    match width {
        2 | 4 => {
            let mut indices = vec![0i32; height];
            for (row, slot) in indices.iter_mut().enumerate() {
                *slot = cat.get_index(row as i64).unwrap_or(0) as i32;
            }
            let mut packed = vec![0u8; crate::packed::byte_len(width, height)];
            for (i, &v) in indices.iter().enumerate() {
                match width {
                    2 => crate::packed::write2(&mut packed, i, v as u8),
                    4 => crate::packed::write4(&mut packed, i, v as u8),
                    _ => unreachable!(),
                }
            }
            out.put_slice(&packed);
        }
        8 => {
            for row in 0..height {
                out.put_u8(cat.get_index(row as i64).unwrap_or(0) as u8);
            }
        }
        16 => {
            for row in 0..height {
                out.put_u16(cat.get_index(row as i64).unwrap_or(0) as u16);
            }
        }
        32 => {
            for row in 0..height {
                out.put_u32(cat.get_index(row as i64).unwrap_or(0));
            }
        }
        other => panic!("unsupported categorical width {other}"),
    }

    let dict = cat.dictionary();
    out.put_u32(dict.len() as u32);
    for i in 1..=dict.len() as u32 {
        let value = dict.get(i).expect("dictionary entries 1..=len are always present");
        write_string(out, &value);
    }
}

fn write_datetime_payload(out: &mut BytesMut, col: &ColumnRef, _height: usize) {
    let dt = col.as_any().downcast_ref::<DateTimeColumn>().expect("date-time value class implies DateTimeColumn");
    let nanos = dt.nanos_raw();
    out.put_u8(nanos.is_some() as u8);
    for &s in dt.seconds_raw() {
        out.put_i64(s);
    }
    if let Some(nanos) = nanos {
        for &n in nanos {
            out.put_u32(n);
        }
    }
}

fn write_time_payload(out: &mut BytesMut, col: &ColumnRef, height: usize) {
    let time = col.as_any().downcast_ref::<TimeColumn>().expect("time value class implies TimeColumn");
    let mut row = [0.0f64; 1];
    for r in 0..height {
        time.fill_f64(&mut row, r as i64);
        let nano = if row[0].is_nan() {
            crate::column::time::MISSING_NANO_OF_DAY
        } else {
            row[0] as u64
        };
        out.put_u64(nano);
    }
}

fn write_object_payload(out: &mut BytesMut, col: &ColumnRef, height: usize) {
    for row in 0..height {
        match col.get_object(row as i64) {
            None => out.put_u8(0),
            Some(ObjectValue::Str(s)) => {
                out.put_u8(1);
                out.put_u8(0);
                write_string(out, &s);
            }
            Some(ObjectValue::Int(i)) => {
                out.put_u8(1);
                out.put_u8(1);
                out.put_i64(i);
            }
            Some(ObjectValue::Float(f)) => {
                out.put_u8(1);
                out.put_u8(2);
                out.put_f64(f);
            }
            Some(ObjectValue::Bytes(b)) => {
                out.put_u8(1);
                out.put_u8(3);
                out.put_u32(b.len() as u32);
                out.put_slice(&b);
            }
        }
    }
}

fn read_payload(buf: &mut &[u8], ty: &TypeDescriptor, cat_width: u8, height: usize) -> Result<ColumnRef> {
    Ok(match ty.value_class {
        ValueClass::Real | ValueClass::Integer => {
            let mut payload = Vec::with_capacity(height);
            for _ in 0..height {
                payload.push(read_f64(buf)?);
            }
            std::sync::Arc::new(DenseDoubleColumn::with_type(ty.clone(), payload))
        }
        ValueClass::Categorical => read_categorical_payload(buf, ty, cat_width, height)?,
        ValueClass::DateTime => read_datetime_payload(buf, height)?,
        ValueClass::Time => read_time_payload(buf, height)?,
        ValueClass::Object => read_object_payload(buf, ty, height)?,
    })
}

fn read_categorical_payload(
    buf: &mut &[u8],
    ty: &TypeDescriptor,
    width: u8,
    height: usize,
) -> Result<ColumnRef> {
    let positive_index = read_u32(buf)?;
    let stored_width = read_u8(buf)?;
    if stored_width != width {
        return Err(Error::DomainViolation(format!(
            "type-table width {width} disagrees with payload width {stored_width}"
        )));
    }
    let indices: Vec<u32> = match width {
        2 | 4 => {
            let byte_len = crate::packed::byte_len(width, height);
            need(buf, byte_len)?;
            let packed = buf[..byte_len].to_vec();
            buf.advance(byte_len);
            (0..height)
                .map(|i| match width {
                    2 => crate::packed::read2(&packed, i) as u32,
                    4 => crate::packed::read4(&packed, i) as u32,
                    _ => unreachable!(),
                })
                .collect()
        }
        8 => (0..height).map(|_| read_u8(buf).map(|v| v as u32)).collect::<Result<_>>()?,
        16 => {
            let mut out = Vec::with_capacity(height);
            for _ in 0..height {
                need(buf, 2)?;
                out.push(buf.get_u16() as u32);
            }
            out
        }
        32 => (0..height).map(|_| read_u32(buf)).collect::<Result<_>>()?,
        other => return Err(Error::DomainViolation(format!("unsupported categorical width {other}"))),
    };

    let dict_count = read_u32(buf)?;
    let dict = Dictionary::new();
    for _ in 0..dict_count {
        dict.intern(&read_string(buf)?);
    }
    for &idx in &indices {
        if idx > dict_count {
            return Err(Error::DomainViolation(format!(
                "categorical index {idx} exceeds dictionary size {dict_count}"
            )));
        }
    }

    let payload = match width {
        2 => CategoricalPayload::W2(
            {
                let mut packed = vec![0u8; crate::packed::byte_len(2, height)];
                for (i, &v) in indices.iter().enumerate() {
                    crate::packed::write2(&mut packed, i, v as u8);
                }
                packed
            },
            height,
        ),
        4 => CategoricalPayload::W4(
            {
                let mut packed = vec![0u8; crate::packed::byte_len(4, height)];
                for (i, &v) in indices.iter().enumerate() {
                    crate::packed::write4(&mut packed, i, v as u8);
                }
                packed
            },
            height,
        ),
        8 => CategoricalPayload::W8(indices.iter().map(|&v| v as u8).collect()),
        16 => CategoricalPayload::W16(indices.iter().map(|&v| v as u16).collect()),
        32 => CategoricalPayload::W32(indices.iter().map(|&v| v as i32).collect()),
        other => return Err(Error::DomainViolation(format!("unsupported categorical width {other}"))),
    };

    let dict = std::sync::Arc::new(dict);
    Ok(if ty.is_boolean {
        let positive_value = dict
            .get(positive_index)
            .ok_or_else(|| Error::DomainViolation("boolean positive index not in dictionary".to_string()))?;
        std::sync::Arc::new(
            CategoricalColumn::new_boolean(ty.id, payload, dict, &positive_value)
                .map_err(|e| Error::DomainViolation(e.to_string()))?,
        )
    } else {
        std::sync::Arc::new(CategoricalColumn::new(ty.id, payload, dict))
    })
}

fn read_datetime_payload(buf: &mut &[u8], height: usize) -> Result<ColumnRef> {
    let has_nanos = read_u8(buf)? != 0;
    let mut seconds = Vec::with_capacity(height);
    for _ in 0..height {
        seconds.push(read_i64(buf)?);
    }
    Ok(if has_nanos {
        let mut nanos = Vec::with_capacity(height);
        for _ in 0..height {
            nanos.push(read_u32(buf)?);
        }
        for (row, (&s, &n)) in seconds.iter().zip(nanos.iter()).enumerate() {
            if s == MISSING_SECONDS && n != 0 {
                return Err(Error::DomainViolation(format!(
                    "row {row}: missing-sentinel seconds with non-zero nanos ({n})"
                )));
            }
        }
        std::sync::Arc::new(DateTimeColumn::from_seconds_and_nanos(seconds, nanos))
    } else {
        std::sync::Arc::new(DateTimeColumn::from_seconds(seconds))
    })
}

fn read_time_payload(buf: &mut &[u8], height: usize) -> Result<ColumnRef> {
    let mut nanos = Vec::with_capacity(height);
    for _ in 0..height {
        nanos.push(read_u64(buf)?);
    }
    Ok(std::sync::Arc::new(TimeColumn::from_nanos(nanos)))
}

fn read_object_payload(buf: &mut &[u8], ty: &TypeDescriptor, height: usize) -> Result<ColumnRef> {
    let mut payload = Vec::with_capacity(height);
    for _ in 0..height {
        let present = read_u8(buf)? != 0;
        if !present {
            payload.push(None);
            continue;
        }
        let tag = read_u8(buf)?;
        payload.push(Some(match tag {
            0 => ObjectValue::Str(read_string(buf)?),
            1 => ObjectValue::Int(read_i64(buf)?),
            2 => ObjectValue::Float(read_f64(buf)?),
            3 => {
                let len = read_u32(buf)? as usize;
                need(buf, len)?;
                let bytes = buf[..len].to_vec();
                buf.advance(len);
                ObjectValue::Bytes(bytes)
            }
            other => return Err(Error::DomainViolation(format!("unknown object tag {other}"))),
        }));
    }
    Ok(std::sync::Arc::new(ObjectColumn::new(ty.id, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::categorical::CategoricalBuffer;
    use crate::column::dense::{TYPE_INTEGER, TYPE_REAL};
    use std::sync::Arc;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("tablecore-format-test-{name}-{}.blt", std::process::id()));
        p
    }

    #[test]
    fn round_trips_dense_and_categorical_columns() {
        let real: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![1.5, f64::NAN, 3.25]));
        let int: ColumnRef = Arc::new(DenseDoubleColumn::with_type(
            TypeDescriptor::new(TYPE_INTEGER, ValueClass::Integer),
            vec![1.0, 2.0, 3.0],
        ));
        let cat_buf = CategoricalBuffer::new(8, 3, 50);
        cat_buf.set(0, "red").unwrap();
        cat_buf.set(1, "blue").unwrap();
        cat_buf.set(2, "red").unwrap();
        let cat: ColumnRef = Arc::new(cat_buf.to_column());

        let table = Table::new(
            vec![real, int, cat],
            vec!["r".to_string(), "i".to_string(), "c".to_string()],
        )
        .unwrap();

        let path = tmp_path("dense-categorical");
        store(&table, &path).unwrap();
        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.width(), 3);
        assert_eq!(loaded.height(), 3);
        let mut dst = [0.0; 3];
        loaded.column("r").unwrap().fill_f64(&mut dst, 0);
        assert_eq!(dst[0], 1.5);
        assert!(dst[1].is_nan());
        assert_eq!(dst[2], 3.25);

        assert_eq!(loaded.column("i").unwrap().column_type().id, TYPE_INTEGER);
        assert_eq!(loaded.column("r").unwrap().column_type().id, TYPE_REAL);
        let loaded_cat = loaded.column("c").unwrap();
        assert_eq!(loaded_cat.get_object(0), Some(ObjectValue::Str("red".to_string())));
        assert_eq!(loaded_cat.get_object(1), Some(ObjectValue::Str("blue".to_string())));
    }

    #[test]
    fn round_trips_boolean_categorical() {
        let buf = CategoricalBuffer::new(2, 3, 99);
        buf.set(0, "yes").unwrap();
        buf.set(1, "no").unwrap();
        buf.set(2, "yes").unwrap();
        let col: ColumnRef = Arc::new(buf.to_boolean_column("yes").unwrap());
        let table = Table::new(vec![col], vec!["flag".to_string()]).unwrap();

        let path = tmp_path("boolean");
        store(&table, &path).unwrap();
        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let cat = loaded.column("flag").unwrap().as_any().downcast_ref::<CategoricalColumn>().unwrap();
        assert_eq!(cat.boolean_at(0), Some(true));
        assert_eq!(cat.boolean_at(1), Some(false));
    }

    #[test]
    fn round_trips_datetime_time_and_object_columns() {
        let dt: ColumnRef = Arc::new(DateTimeColumn::from_seconds_and_nanos(
            vec![0, crate::column::datetime::MISSING_SECONDS, 86_400],
            vec![500, 0, 0],
        ));
        let time: ColumnRef = Arc::new(TimeColumn::from_nanos(vec![
            0,
            crate::column::time::MISSING_NANO_OF_DAY,
            crate::column::time::NANOS_PER_DAY - 1,
        ]));
        let obj: ColumnRef = Arc::new(ObjectColumn::new(
            200,
            vec![Some(ObjectValue::Str("hi".to_string())), None, Some(ObjectValue::Bytes(vec![1, 2, 3]))],
        ));
        let table = Table::new(
            vec![dt, time, obj],
            vec!["d".to_string(), "t".to_string(), "o".to_string()],
        )
        .unwrap();

        let path = tmp_path("temporal-object");
        store(&table, &path).unwrap();
        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(loaded.column("d").unwrap().is_missing(1));
        assert!(!loaded.column("t").unwrap().is_missing(2));
        assert_eq!(loaded.column("o").unwrap().get_object(0), Some(ObjectValue::Str("hi".to_string())));
        assert_eq!(loaded.column("o").unwrap().get_object(2), Some(ObjectValue::Bytes(vec![1, 2, 3])));
    }

    #[test]
    fn rejects_datetime_sentinel_conflict() {
        let dt_type = TypeDescriptor::new(crate::column::datetime::TYPE_DATETIME, ValueClass::DateTime);

        let mut out = BytesMut::with_capacity(64);
        write_header(&mut out, 1, 1);
        write_type_record(&mut out, &dt_type, 0);
        write_name_region(&mut out, &["d".to_string()]);
        out.put_u8(1); // has_nanos
        out.put_i64(MISSING_SECONDS);
        out.put_u32(500); // non-zero nanos on a missing-sentinel row

        let path = tmp_path("datetime-sentinel-conflict");
        std::fs::write(&path, &out).unwrap();
        let err = load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, Error::DomainViolation(_)));
    }

    #[test]
    fn rejects_bad_magic() {
        let path = tmp_path("bad-magic");
        std::fs::write(&path, [0u8; 16]).unwrap();
        let err = load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, Error::InvalidMagic));
    }

    #[test]
    fn rejects_truncated_file() {
        let path = tmp_path("truncated");
        std::fs::write(&path, &MAGIC).unwrap();
        let err = load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, Error::Truncated { .. }));
    }

    #[test]
    fn rejects_negative_width_or_height() {
        let mut header = Vec::with_capacity(16);
        header.extend_from_slice(&MAGIC);
        header.push(VERSION_MAJOR);
        header.push(VERSION_MINOR);
        header.extend_from_slice(&[0, 0]); // reserved
        header.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes()); // width
        header.extend_from_slice(&0u32.to_be_bytes()); // height
        let path = tmp_path("negative-width");
        std::fs::write(&path, &header).unwrap();
        let err = load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, Error::DomainViolation(_)));

        let mut header = Vec::with_capacity(16);
        header.extend_from_slice(&MAGIC);
        header.push(VERSION_MAJOR);
        header.push(VERSION_MINOR);
        header.extend_from_slice(&[0, 0]);
        header.extend_from_slice(&0u32.to_be_bytes());
        header.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes()); // height
        let path = tmp_path("negative-height");
        std::fs::write(&path, &header).unwrap();
        let err = load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, Error::DomainViolation(_)));
    }

    #[test]
    fn chunked_io_matches_single_shot_for_small_block_limit() {
        let real: ColumnRef = Arc::new(DenseDoubleColumn::from_values((0..500).map(|i| i as f64).collect()));
        let table = Table::new(vec![real], vec!["v".to_string()]).unwrap();
        let path = tmp_path("chunked");
        store_with_block_limit(&table, &path, 17).unwrap();
        let loaded = load_with_block_limit(&path, 23).unwrap();
        std::fs::remove_file(&path).ok();
        let mut dst = [0.0; 500];
        loaded.column("v").unwrap().fill_f64(&mut dst, 0);
        assert_eq!(dst[499], 499.0);
    }

    #[test]
    fn surrogate_pair_utf8_labels_round_trip() {
        let real: ColumnRef = Arc::new(DenseDoubleColumn::from_values(vec![1.0]));
        let label = "col-\u{1F600}-name".to_string();
        let table = Table::new(vec![real], vec![label.clone()]).unwrap();
        let path = tmp_path("utf8-label");
        store(&table, &path).unwrap();
        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.labels()[0], label);
    }
}
