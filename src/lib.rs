//! # tablecore
//!
//! An in-memory, columnar table engine for analytics workloads. Columns are
//! built once through mutable, concurrently-writable buffers, then frozen
//! into immutable storage; every transform after that point produces a new
//! column or row-map rather than mutating one in place.
//!
//! # Quick Start
//!
//! ```
//! use tablecore::buffer::categorical::CategoricalBuffer;
//! use tablecore::column::ColumnRef;
//! use tablecore::table::Table;
//! use std::sync::Arc;
//!
//! let buf = CategoricalBuffer::new(8, 3, 1);
//! buf.set(0, "red").unwrap();
//! buf.set(1, "blue").unwrap();
//! buf.set(2, "red").unwrap();
//! let col: ColumnRef = Arc::new(buf.to_column());
//!
//! let table = Table::new(vec![col], vec!["color".to_string()]).unwrap();
//! assert_eq!(table.height(), 3);
//! ```
//!
//! # Modules
//!
//! - [`column`] - Frozen column variants and the [`column::Column`] contract
//! - [`buffer`] - Mutable builders that freeze into column variants
//! - [`dictionary`] - Append-only string dictionaries backing categoricals
//! - [`packed`] - Sub-byte packed-integer codec for categorical indices
//! - [`sort`] - Stable, nulls-last row ordering
//! - [`executor`] - Workload-classed parallel batch executor
//! - [`transform`] - Numeric map, object reduce, row-select, parallel sort
//! - [`table`] - The [`table::Table`] object
//! - [`format`] - Binary on-disk table format
//! - [`error`] - Error types and `Result` alias

#![warn(missing_docs)]

/// Mutable builders that freeze into the immutable column variants.
pub mod buffer;
/// Column variants and the public `Column` contract.
pub mod column;
/// Append-only dictionaries backing categorical columns.
pub mod dictionary;
/// Error types and `Result` alias.
pub mod error;
/// The data-parallel executor: workload-classed batch planning, dispatch,
/// progress reporting, and cooperative cancellation.
pub mod executor;
/// Binary on-disk table format.
pub mod format;
/// Sub-byte packed-integer codec for categorical indices.
pub mod packed;
/// Stable, nulls-last row ordering.
pub mod sort;
/// The table object.
pub mod table;
/// Transform DSL: numeric map, object reduce, row-select, parallel sort.
pub mod transform;

pub use column::{Column, ColumnRef};
pub use error::{Error, Result};
pub use table::Table;
