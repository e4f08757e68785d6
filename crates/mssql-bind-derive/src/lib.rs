// mssql-bind-derive: derive macros for mssql-bind
//
// - #[derive(Bindable)] - binding table, member access and constructors for a struct
// - #[derive(SqlEnum)] - label/ordinal conversions for a fieldless enum
//
// Generated code refers to the runtime crate as `::mssql_bind`.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod attrs;
mod bindable;
mod sql_enum;

/// Derives `Bindable`, `BindableType` and a static `Shape` for a struct with
/// named fields.
///
/// Container attributes:
/// - `#[bind(table_type = "dbo.Lines")]`: table type used when records of
///   this type are bound as a table value
/// - `#[bind(constructor(a, b = "B", visibility = "private", explicit))]`:
///   a constructor taking the listed fields, optionally renaming its
///   parameters; repeatable
/// - `#[bind(default)]`: keep the `Default` constructor alongside declared
///   ones (it is implied when none are declared)
///
/// Field attributes:
/// - `name = ".."`: declared member name (defaults to the field name)
/// - `rename = ".."`: parameter name override
/// - `skip`: excluded from parameter binding
/// - `ignore`: not part of the shape at all; filled with `Default` on construction
/// - `field`: a private field rather than a public property
/// - `readonly`: a read-only property with a writable backing field
/// - `visibility = "public" | "internal" | "private"`
/// - `table`: bind as a table value (implied for `Vec<T>` with `T` not `u8`)
/// - `table_type = ".."`: table type of a table-valued member
///
/// # Example
///
/// ```ignore
/// #[derive(Bindable, Default)]
/// #[bind(constructor(id = "Id", name = "Name", explicit))]
/// struct Customer {
///     #[bind(name = "Id")]
///     id: i32,
///     #[bind(name = "Name")]
///     name: String,
///     #[bind(name = "Orders", table_type = "dbo.OrderList")]
///     orders: Vec<Order>,
/// }
/// ```
#[proc_macro_derive(Bindable, attributes(bind))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    bindable::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `SqlEnum` and `SqlField` for a fieldless enum.
///
/// Ordinals are the discriminants; the underlying integer type follows
/// `#[repr(..)]` (default `int`). `#[bind(rename = "..")]` on a variant
/// overrides its label.
#[proc_macro_derive(SqlEnum, attributes(bind))]
pub fn derive_sql_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    sql_enum::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
