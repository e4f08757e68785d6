//! Parameter binding: from bound objects to executor parameters and back.
//!
//! - [`inspect`]: which members take part in binding
//! - [`params`]: descriptors, executor parameters and output write-back
//! - [`coerce`]: scalar coercion rules
//! - [`table`]: table-valued expansion of record collections
//! - [`datetime`]: UTC normalization and the `datetime` domain

pub mod coerce;
pub mod datetime;
pub mod inspect;
pub mod params;
pub mod table;

pub use datetime::SqlDateTime;
pub use inspect::{bindable, inspect, MemberDescriptor};
pub use params::{
    build_input_parameters, build_output_parameters, materialize_parameters, write_back_outputs,
    BoundValue, Direction, ExecutorParameter, ParameterBuilder, ParameterDescriptor,
    ParameterValue,
};
pub use table::{expand, TableColumn, TabularValue};
