//! Transform DSL entry points: numeric map, object reduce, row-select, and
//! executor-driven sort, each realized as an [`crate::executor::Calculator`].

pub mod numeric_map;
pub mod parallel_sort;
pub mod reduce;
pub mod row_select;

pub use numeric_map::NumericMapCalculator;
pub use parallel_sort::parallel_sort;
pub use reduce::ObjectReduceCalculator;
pub use row_select::{select_range, select_rows};
