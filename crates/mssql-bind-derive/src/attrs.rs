// #[bind(..)] attribute parsing

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Ident, LitStr, Result, Token};

/// Member or constructor visibility tier.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Vis {
    Public,
    Internal,
    Private,
}

impl Vis {
    fn parse(lit: &LitStr) -> Result<Self> {
        match lit.value().as_str() {
            "public" => Ok(Vis::Public),
            "internal" => Ok(Vis::Internal),
            "private" => Ok(Vis::Private),
            _ => Err(syn::Error::new(
                lit.span(),
                "visibility must be \"public\", \"internal\" or \"private\"",
            )),
        }
    }

    pub fn tokens(self) -> TokenStream {
        match self {
            Vis::Public => quote!(::mssql_bind::core::Visibility::Public),
            Vis::Internal => quote!(::mssql_bind::core::Visibility::Internal),
            Vis::Private => quote!(::mssql_bind::core::Visibility::Private),
        }
    }
}

/// One `constructor(..)` entry.
pub struct ConstructorAttr {
    /// Field names with optional parameter name overrides, in order.
    pub params: Vec<(Ident, Option<LitStr>)>,
    pub visibility: Vis,
    pub explicit: bool,
}

#[derive(Default)]
pub struct ContainerAttrs {
    pub table_type: Option<LitStr>,
    pub constructors: Vec<ConstructorAttr>,
    pub default_constructor: bool,
}

#[derive(Default)]
pub struct FieldAttrs {
    pub name: Option<LitStr>,
    pub rename: Option<LitStr>,
    pub skip: bool,
    pub ignore: bool,
    pub field: bool,
    pub readonly: bool,
    pub table: bool,
    pub table_type: Option<LitStr>,
    pub visibility: Option<Vis>,
}

#[derive(Default)]
pub struct VariantAttrs {
    pub rename: Option<LitStr>,
}

fn bind_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|a| a.path().is_ident("bind"))
}

pub fn parse_container(attrs: &[Attribute]) -> Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in bind_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table_type") {
                out.table_type = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("default") {
                out.default_constructor = true;
                Ok(())
            } else if meta.path.is_ident("constructor") {
                let mut ctor = ConstructorAttr {
                    params: Vec::new(),
                    visibility: Vis::Public,
                    explicit: false,
                };
                meta.parse_nested_meta(|inner| {
                    if inner.path.is_ident("visibility") {
                        let lit: LitStr = inner.value()?.parse()?;
                        ctor.visibility = Vis::parse(&lit)?;
                    } else if inner.path.is_ident("explicit") {
                        ctor.explicit = true;
                    } else if let Some(ident) = inner.path.get_ident() {
                        let alias = if inner.input.peek(Token![=]) {
                            Some(inner.value()?.parse::<LitStr>()?)
                        } else {
                            None
                        };
                        ctor.params.push((ident.clone(), alias));
                    } else {
                        return Err(inner.error("expected a field name"));
                    }
                    Ok(())
                })?;
                out.constructors.push(ctor);
                Ok(())
            } else {
                Err(meta.error("unsupported bind attribute"))
            }
        })?;
    }
    Ok(out)
}

pub fn parse_field(attrs: &[Attribute]) -> Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in bind_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                out.name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("rename") {
                out.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("skip") {
                out.skip = true;
            } else if meta.path.is_ident("ignore") {
                out.ignore = true;
            } else if meta.path.is_ident("field") {
                out.field = true;
            } else if meta.path.is_ident("readonly") {
                out.readonly = true;
            } else if meta.path.is_ident("table") {
                out.table = true;
            } else if meta.path.is_ident("table_type") {
                out.table_type = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("visibility") {
                let lit: LitStr = meta.value()?.parse()?;
                out.visibility = Some(Vis::parse(&lit)?);
            } else {
                return Err(meta.error("unsupported bind attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

pub fn parse_variant(attrs: &[Attribute]) -> Result<VariantAttrs> {
    let mut out = VariantAttrs::default();
    for attr in bind_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                out.rename = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported bind attribute"))
            }
        })?;
    }
    Ok(out)
}
