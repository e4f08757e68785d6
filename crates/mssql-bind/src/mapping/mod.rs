//! Row mapping: result-set columns to constructors and members.
//!
//! - [`type_map`]: per-type resolution of columns to targets
//! - [`cache`]: the per-provider registry of type maps
//! - [`materialize`]: building values from rows
//! - [`member`]: resolved column targets

pub mod cache;
pub mod materialize;
pub mod member;
pub mod type_map;

pub use cache::{Registration, TypeMapCache};
pub use materialize::{ColumnInfo, RowMapper};
pub use member::{BindingTarget, MemberBinding};
pub use type_map::TypeMap;
