//! # mssql-bind
//!
//! Parameter binding and row materialization for SQL Server data access.
//!
//! This library sits between application objects and a database driver:
//!
//! - **Parameter binding** from the members of an input object, with
//!   table-valued expansion of record collections
//! - **Output write-back** into the members of an output object
//! - **Row materialization** through a constructor and member map per type
//! - **Scalar coercion** of booleans, enumerations and timestamps
//!
//! The driver itself is abstracted behind [`CommandExecutor`].
//!
//! ## Example
//!
//! ```rust
//! use mssql_bind::binding::ParameterBuilder;
//! use mssql_bind::config::BindingConfig;
//! use mssql_bind::Bindable;
//!
//! #[derive(Bindable, Default)]
//! struct NewUser {
//!     #[bind(name = "UserName")]
//!     user_name: String,
//!     #[bind(name = "IsAdmin")]
//!     is_admin: bool,
//! }
//!
//! let user = NewUser { user_name: "ada".into(), is_admin: true };
//! let builder = ParameterBuilder::new(Some(&user), None)?;
//! let params = builder.parameters(&BindingConfig::default())?;
//! assert_eq!(params.len(), 2);
//! assert_eq!(params[1].name, "IsAdmin");
//! # Ok::<(), mssql_bind::BindError>(())
//! ```

// Lets the derive macros' `::mssql_bind::` paths resolve inside this crate.
extern crate self as mssql_bind;

pub mod binding;
pub mod config;
pub mod core;
pub mod error;
pub mod mapping;
pub mod provider;

// Re-exports for convenient access
pub use binding::{Direction, ExecutorParameter, ParameterValue, SqlDateTime, TabularValue};
pub use config::{Config, CommandType};
pub use self::core::{Bindable, BindableType, SqlEnum, SqlField, SqlType, SqlValue};
pub use error::{BindError, ConvertError, Result};
pub use mapping::{ColumnInfo, TypeMap, TypeMapCache};
pub use provider::{
    Call, Command, CommandExecutor, DataProvider, ExecutedCommand, ResultSet,
};

pub use mssql_bind_derive::{Bindable, SqlEnum};
