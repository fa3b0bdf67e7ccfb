//! Derive macros for the `bevy_verbs` crate.

use proc_macro::{self, TokenStream};
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{crate_name, FoundCrate};
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Derives `ActionParams`, listing the fields marked with `#[param(...)]`
/// in declaration order.
///
/// The struct takes an optional `#[action(name = "..", description = "..")]`.
/// Each field takes `#[param(kind = Kind, description = "..", required, default = "..")]`
/// or `#[param(skip)]` for internal state. Fields without `param` are skipped too.
#[proc_macro_derive(ActionParams, attributes(action, param))]
pub fn derive_action_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A parsed `#[param(...)]` attribute.
struct Param {
    /// The field name.
    name: String,
    /// The `ParamKind` variant.
    kind: Ident,
    /// What the parameter does.
    description: String,
    /// Whether a value must be set.
    required: bool,
    /// The default value, as written in scripts.
    default: Option<String>,
}

/// Builds the `ActionParams` impl.
fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let path = crate_path();

    let mut name = ident.to_string().to_lowercase();
    let mut description = String::new();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("action")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = meta.value()?.parse::<LitStr>()?.value();
                Ok(())
            } else if meta.path.is_ident("description") {
                description = meta.value()?.parse::<LitStr>()?.value();
                Ok(())
            } else {
                Err(meta.error("unsupported action attribute"))
            }
        })?;
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "ActionParams can only be derived for structs with named fields.",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "ActionParams can only be derived for structs.",
            ))
        }
    };

    let mut params = vec![];
    for field in fields {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("param")) {
            let mut kind = None;
            let mut description = String::new();
            let mut required = false;
            let mut default = None;
            let mut skip = false;

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("kind") {
                    kind = Some(meta.value()?.parse::<Ident>()?);
                } else if meta.path.is_ident("description") {
                    description = meta.value()?.parse::<LitStr>()?.value();
                } else if meta.path.is_ident("required") {
                    required = true;
                } else if meta.path.is_ident("default") {
                    default = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("skip") {
                    skip = true;
                } else {
                    return Err(meta.error("unsupported param attribute"));
                }
                Ok(())
            })?;

            if skip {
                continue;
            }
            let Some(kind) = kind else {
                return Err(syn::Error::new_spanned(attr, "missing `kind` in param"));
            };
            params.push(Param {
                name: field_ident.to_string().trim_start_matches("r#").to_string(),
                kind,
                description,
                required,
                default,
            });
        }
    }

    let infos = params.iter().map(|p| {
        let Param {
            name,
            kind,
            description,
            required,
            default,
        } = p;
        let default = match default {
            Some(value) => quote!(Some(#value)),
            None => quote!(None),
        };
        quote! {
            #path::params::ParamInfo {
                name: #name,
                kind: #path::params::ParamKind::#kind,
                description: #description,
                required: #required,
                default: #default,
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics #path::params::ActionParams for #ident #ty_generics #where_clause {
            fn descriptor() -> #path::params::ActionDescriptor {
                const PARAMS: &[#path::params::ParamInfo] = &[ #( #infos ),* ];
                #path::params::ActionDescriptor {
                    name: #name,
                    description: #description,
                    params: PARAMS,
                }
            }
        }
    })
}

/// The path of the `bevy_verbs` crate as seen from the derive call site.
fn crate_path() -> TokenStream2 {
    match crate_name("bevy_verbs") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        // bevy_verbs declares `extern crate self as bevy_verbs`
        Ok(FoundCrate::Itself) | Err(_) => quote!(::bevy_verbs),
    }
}
