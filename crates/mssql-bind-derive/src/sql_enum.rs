// #[derive(SqlEnum)] implementation

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Result};

use crate::attrs;

/// Underlying integer type from `#[repr(..)]`, as a `SqlType` variant name.
fn underlying(attrs: &[Attribute]) -> Result<&'static str> {
    let mut found = "I32";
    for attr in attrs.iter().filter(|a| a.path().is_ident("repr")) {
        attr.parse_nested_meta(|meta| {
            if meta.input.peek(syn::token::Paren) {
                // align(N) and similar
                let _content;
                syn::parenthesized!(_content in meta.input);
                return Ok(());
            }
            let Some(ident) = meta.path.get_ident() else {
                return Ok(());
            };
            found = match ident.to_string().as_str() {
                "u8" => "U8",
                "i8" | "i16" => "I16",
                "u16" | "i32" => "I32",
                "u32" | "i64" | "u64" | "isize" | "usize" => "I64",
                _ => found,
            };
            Ok(())
        })?;
    }
    Ok(found)
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(SqlEnum)] does not support generic types",
        ));
    }
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "#[derive(SqlEnum)] only supports enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "#[derive(SqlEnum)] requires at least one variant",
        ));
    }

    let ident = &input.ident;
    let name = LitStr::new(&ident.to_string(), ident.span());
    let underlying = format_ident!("{}", underlying(&input.attrs)?);

    let mut variants = Vec::new();
    let mut labels = Vec::new();
    let mut seen = HashSet::new();
    for v in &data.variants {
        if !matches!(v.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                v,
                "#[derive(SqlEnum)] requires fieldless variants",
            ));
        }
        let label = match attrs::parse_variant(&v.attrs)?.rename {
            Some(lit) => lit,
            None => LitStr::new(&v.ident.to_string(), v.ident.span()),
        };
        if !seen.insert(label.value()) {
            return Err(syn::Error::new_spanned(v, "duplicate variant label"));
        }
        variants.push(&v.ident);
        labels.push(label);
    }

    Ok(quote! {
        impl ::mssql_bind::core::SqlEnum for #ident {
            fn enum_info() -> &'static ::mssql_bind::core::EnumInfo {
                static INFO: ::mssql_bind::core::EnumInfo = ::mssql_bind::core::EnumInfo {
                    name: #name,
                    underlying: ::mssql_bind::core::SqlType::#underlying,
                    variants: &[#((#labels, #ident::#variants as i64)),*],
                };
                &INFO
            }

            fn label(&self) -> &'static str {
                match self {
                    #(Self::#variants => #labels,)*
                }
            }

            fn ordinal(&self) -> i64 {
                *self as i64
            }

            fn from_label(label: &str) -> ::core::option::Option<Self> {
                match label {
                    #(#labels => return ::core::option::Option::Some(Self::#variants),)*
                    _ => {}
                }
                let ordinal = <Self as ::mssql_bind::core::SqlEnum>::enum_info().ordinal_of(label)?;
                <Self as ::mssql_bind::core::SqlEnum>::from_ordinal(ordinal)
            }

            fn from_ordinal(ordinal: i64) -> ::core::option::Option<Self> {
                #(
                    if ordinal == Self::#variants as i64 {
                        return ::core::option::Option::Some(Self::#variants);
                    }
                )*
                ::core::option::Option::None
            }
        }

        impl ::mssql_bind::core::SqlField for #ident {
            fn declared_type() -> ::mssql_bind::core::DeclaredType {
                ::mssql_bind::core::DeclaredType::enumeration(
                    <Self as ::mssql_bind::core::SqlEnum>::enum_info(),
                )
            }

            fn to_member_value(&self) -> ::mssql_bind::core::MemberValue<'_> {
                ::mssql_bind::core::MemberValue::Enum(
                    ::mssql_bind::core::SqlEnum::enum_value(self),
                )
            }

            fn from_sql(
                value: ::mssql_bind::core::SqlValue<'_>,
            ) -> ::core::result::Result<Self, ::mssql_bind::error::ConvertError> {
                ::mssql_bind::core::enum_from_sql::<Self>(value)
            }
        }
    })
}
