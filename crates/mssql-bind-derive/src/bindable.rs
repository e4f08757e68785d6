// #[derive(Bindable)] implementation
//
// Emits, for a struct with named fields:
// - `Bindable`: member reads and writes addressed by declared name
// - `BindableType`: a `Shape` built once on first use, plus `construct`

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, GenericArgument, Ident, LitStr, PathArguments, Result, Type};

use crate::attrs::{self, ConstructorAttr, FieldAttrs};

struct FieldInfo {
    ident: Ident,
    ty: Type,
    attrs: FieldAttrs,
    member_name: String,
    is_table: bool,
}

impl FieldInfo {
    fn name_lit(&self) -> LitStr {
        LitStr::new(&self.member_name, self.ident.span())
    }

    fn backing_lit(&self) -> LitStr {
        LitStr::new(&format!("<{}>k__BackingField", self.member_name), self.ident.span())
    }

    /// A property exposed read-only, with a writable backing field.
    fn has_backing_field(&self) -> bool {
        self.attrs.readonly && !self.attrs.field
    }

    fn declared(&self) -> TokenStream {
        let ty = &self.ty;
        if self.is_table {
            quote!(<#ty as ::mssql_bind::core::RecordSet>::declared_type())
        } else {
            quote!(<#ty as ::mssql_bind::core::SqlField>::declared_type())
        }
    }
}

/// Last path segment of a type and its single generic type argument.
fn single_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else { return None };
    let last = path.path.segments.last()?;
    if last.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn is_byte(ty: &Type) -> bool {
    matches!(ty, Type::Path(p) if p.path.is_ident("u8"))
}

/// `Vec<T>` (or `Option<Vec<T>>`) with `T` other than `u8`.
fn is_record_collection(ty: &Type) -> bool {
    if let Some(inner) = single_generic(ty, "Option") {
        return is_record_collection(inner);
    }
    match single_generic(ty, "Vec") {
        Some(element) => !is_byte(element),
        None => false,
    }
}

fn collect_fields(input: &DeriveInput) -> Result<Vec<FieldInfo>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "#[derive(Bindable)] only supports structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "#[derive(Bindable)] requires named fields",
        ));
    };

    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(named.named.len());
    for f in &named.named {
        let ident = f
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(f, "expected a named field"))?;
        let attrs = attrs::parse_field(&f.attrs)?;
        let member_name = match &attrs.name {
            Some(lit) => lit.value(),
            None => ident.to_string().trim_start_matches("r#").to_string(),
        };
        let is_table = attrs.table || is_record_collection(&f.ty);

        if !attrs.ignore {
            if member_name.is_empty() {
                return Err(syn::Error::new_spanned(f, "member name cannot be empty"));
            }
            if !seen.insert(member_name.clone()) {
                return Err(syn::Error::new_spanned(
                    f,
                    format!("duplicate member name `{}`", member_name),
                ));
            }
            let backing = format!("<{}>k__BackingField", member_name);
            if attrs.readonly && !attrs.field && !seen.insert(backing) {
                return Err(syn::Error::new_spanned(
                    f,
                    "backing field name collides with another member",
                ));
            }
        }

        fields.push(FieldInfo {
            ident,
            ty: f.ty.clone(),
            attrs,
            member_name,
            is_table,
        });
    }
    Ok(fields)
}

fn member_defs(fields: &[FieldInfo]) -> Vec<TokenStream> {
    let mut defs = Vec::new();
    for f in fields.iter().filter(|f| !f.attrs.ignore) {
        let name = f.name_lit();
        let declared = f.declared();
        let mut def = if f.attrs.field {
            quote!(::mssql_bind::core::MemberDef::field(#name, #declared))
        } else {
            quote!(::mssql_bind::core::MemberDef::property(#name, #declared))
        };
        if let Some(rename) = &f.attrs.rename {
            def = quote!(#def.renamed(#rename));
        }
        if f.attrs.skip {
            def = quote!(#def.not_mapped());
        }
        if f.attrs.readonly {
            def = quote!(#def.read_only());
        }
        if let Some(vis) = f.attrs.visibility {
            let vis = vis.tokens();
            def = quote!(#def.with_visibility(#vis));
        }
        if let Some(table_type) = &f.attrs.table_type {
            def = quote!(#def.with_table_type(#table_type));
        }
        defs.push(def);

        if f.has_backing_field() {
            let backing = f.backing_lit();
            defs.push(quote!(::mssql_bind::core::MemberDef::field(#backing, #declared)));
        }
    }
    defs
}

fn read_arms(fields: &[FieldInfo]) -> Vec<TokenStream> {
    let mut arms = Vec::new();
    for f in fields.iter().filter(|f| !f.attrs.ignore) {
        let ident = &f.ident;
        let ty = &f.ty;
        let value = if f.is_table {
            quote!(::mssql_bind::core::MemberValue::Records(
                <#ty as ::mssql_bind::core::RecordSet>::records(&self.#ident)
            ))
        } else {
            quote!(<#ty as ::mssql_bind::core::SqlField>::to_member_value(&self.#ident))
        };
        let name = f.name_lit();
        arms.push(quote!(#name => ::core::option::Option::Some(#value),));
        if f.has_backing_field() {
            let backing = f.backing_lit();
            arms.push(quote!(#backing => ::core::option::Option::Some(#value),));
        }
    }
    arms
}

fn write_arms(fields: &[FieldInfo], type_name: &LitStr) -> Vec<TokenStream> {
    let mut arms = Vec::new();
    for f in fields.iter().filter(|f| !f.attrs.ignore) {
        let ident = &f.ident;
        let ty = &f.ty;
        let name = f.name_lit();
        let assign = quote!({
            self.#ident = <#ty as ::mssql_bind::core::SqlField>::from_sql(value)
                .map_err(|e| ::mssql_bind::error::BindError::conversion(member, e))?;
            ::core::result::Result::Ok(())
        });

        if f.is_table {
            arms.push(quote!(#name => ::core::result::Result::Err(
                ::mssql_bind::error::BindError::Config(::std::format!(
                    "{}.{} is table-valued and cannot be assigned", #type_name, member
                ))
            ),));
        } else if f.attrs.readonly {
            arms.push(quote!(#name => ::core::result::Result::Err(
                ::mssql_bind::error::BindError::Config(::std::format!(
                    "{}.{} is read-only", #type_name, member
                ))
            ),));
            if f.has_backing_field() {
                let backing = f.backing_lit();
                arms.push(quote!(#backing => #assign));
            }
        } else {
            arms.push(quote!(#name => #assign));
        }
    }
    arms
}

struct Constructors {
    defs: Vec<TokenStream>,
    arms: Vec<TokenStream>,
}

fn constructors(
    fields: &[FieldInfo],
    declared: &[ConstructorAttr],
    keep_default: bool,
) -> Result<Constructors> {
    let mut defs = Vec::new();
    let mut arms = Vec::new();
    let mut index = 0usize;

    if declared.is_empty() || keep_default {
        defs.push(quote!(::mssql_bind::core::ConstructorDef::public(::std::vec::Vec::new())));
        arms.push(quote!(
            #index => ::core::result::Result::Ok(<Self as ::core::default::Default>::default()),
        ));
        index += 1;
    }

    for ctor in declared {
        let mut used = HashSet::new();
        let mut params = Vec::new();
        let mut inits = Vec::new();
        for (ident, alias) in &ctor.params {
            let field = fields
                .iter()
                .find(|f| f.ident == *ident && !f.attrs.ignore)
                .ok_or_else(|| {
                    syn::Error::new(ident.span(), format!("no bound field named `{}`", ident))
                })?;
            if field.is_table {
                return Err(syn::Error::new(
                    ident.span(),
                    "table-valued fields cannot be constructor parameters",
                ));
            }
            if !used.insert(ident.to_string()) {
                return Err(syn::Error::new(ident.span(), "field listed twice in one constructor"));
            }

            let param_name = alias.clone().unwrap_or_else(|| field.name_lit());
            let ty = &field.ty;
            let declared = field.declared();
            params.push(quote!(::mssql_bind::core::ParamDef::new(#param_name, #declared)));
            inits.push(quote!(
                #ident: <#ty as ::mssql_bind::core::SqlField>::from_sql(
                    args.next().unwrap_or(::mssql_bind::core::SqlValue::Null(
                        ::mssql_bind::core::SqlType::Text,
                    ))
                ).map_err(|e| ::mssql_bind::error::BindError::conversion(#param_name, e))?
            ));
        }
        for f in fields.iter().filter(|f| !used.contains(&f.ident.to_string())) {
            let ident = &f.ident;
            inits.push(quote!(#ident: ::core::default::Default::default()));
        }

        let vis = ctor.visibility.tokens();
        let mut def = quote!(
            ::mssql_bind::core::ConstructorDef::new(#vis, ::std::vec![#(#params),*])
        );
        if ctor.explicit {
            def = quote!(#def.explicit());
        }
        defs.push(def);
        arms.push(quote!(#index => ::core::result::Result::Ok(Self { #(#inits),* }),));
        index += 1;
    }

    Ok(Constructors { defs, arms })
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(Bindable)] does not support generic types",
        ));
    }

    let ident = &input.ident;
    let type_name = LitStr::new(&ident.to_string(), ident.span());
    let container = attrs::parse_container(&input.attrs)?;
    let fields = collect_fields(&input)?;

    let members = member_defs(&fields);
    let reads = read_arms(&fields);
    let writes = write_arms(&fields, &type_name);
    let Constructors { defs: ctor_defs, arms: ctor_arms } =
        constructors(&fields, &container.constructors, container.default_constructor)?;
    let table_type = container
        .table_type
        .as_ref()
        .map(|t| quote!(.with_table_type(#t)));

    Ok(quote! {
        impl ::mssql_bind::core::Bindable for #ident {
            fn shape(&self) -> &'static ::mssql_bind::core::Shape {
                <Self as ::mssql_bind::core::BindableType>::type_shape()
            }

            fn read(
                &self,
                member: &str,
            ) -> ::core::option::Option<::mssql_bind::core::MemberValue<'_>> {
                match member {
                    #(#reads)*
                    _ => ::core::option::Option::None,
                }
            }

            fn write(
                &mut self,
                member: &str,
                value: ::mssql_bind::core::SqlValue<'_>,
            ) -> ::mssql_bind::error::Result<()> {
                match member {
                    #(#writes)*
                    _ => {
                        let _ = value;
                        ::core::result::Result::Err(::mssql_bind::error::BindError::Config(
                            ::std::format!("{} has no writable member '{}'", #type_name, member),
                        ))
                    }
                }
            }
        }

        impl ::mssql_bind::core::BindableType for #ident {
            fn type_shape() -> &'static ::mssql_bind::core::Shape {
                static SHAPE: ::std::sync::OnceLock<::mssql_bind::core::Shape> =
                    ::std::sync::OnceLock::new();
                SHAPE.get_or_init(|| {
                    ::mssql_bind::core::Shape::new::<#ident>(#type_name)
                        #table_type
                        #(.with_member(#members))*
                        #(.with_constructor(#ctor_defs))*
                })
            }

            #[allow(unused_mut, unused_variables)]
            fn construct(
                constructor: &::mssql_bind::core::ConstructorDef,
                args: ::std::vec::Vec<::mssql_bind::core::SqlValue<'static>>,
            ) -> ::mssql_bind::error::Result<Self> {
                let mut args = args.into_iter();
                match constructor.index() {
                    #(#ctor_arms)*
                    other => ::core::result::Result::Err(
                        ::mssql_bind::error::BindError::Config(::std::format!(
                            "{} has no constructor #{}", #type_name, other
                        )),
                    ),
                }
            }
        }
    })
}
