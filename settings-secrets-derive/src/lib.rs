//! Derive macro for the settings-secrets library
//!
//! This crate provides `#[derive(SettingsSchema)]` for generating the schema of
//! a settings struct from its fields.
//!
//! # Usage
//!
//! ```text
//! use settings_secrets::DeriveSettingsSchema;
//!
//! #[derive(Deserialize, DeriveSettingsSchema)]
//! struct DatabaseSettings {
//!     host: String,
//!
//!     #[setting(default = 3306, min = 1, max = 65535)]
//!     port: u16,
//!
//!     #[setting(secret_name = "test-db-password", secret_version = "v2")]
//!     password: String,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, ExprUnary, Fields, GenericArgument, Lit, Meta,
    PathArguments, Type, UnOp, parse_macro_input, punctuated::Punctuated,
};

/// Derive macro for generating `SettingsSchema` implementations.
///
/// Field kinds follow the Rust type:
/// - `bool` → toggle, integers → integer, `f32`/`f64` → number
/// - `String`, `char`, `PathBuf` → text
/// - `Vec`, `HashSet`, `BTreeSet`, `VecDeque` → list
/// - maps, tuples, arrays, `serde_json::Value` → json
/// - `Option<T>` → kind of `T`, optional (defaults to `null`)
/// - any other type → nested, using `T::schema()`
///
/// # Field attributes (`#[setting(...)]`)
/// - `secret_name = "..."` - Literal secret name
/// - `secret_name_env = "VAR"` - Env var holding the secret name
/// - `secret_version = "..."` - Literal secret version
/// - `secret_version_env = "VAR"` - Env var holding the secret version
/// - `default = <expr>` - Default value (anything convertible into a JSON value)
/// - `default` - For nested fields: start from an empty object so inner defaults apply
/// - `description = "..."` - Help text
/// - `min = 0` / `max = 100` - Numeric range
/// - `pattern = "regex"` - Pattern for text fields
/// - `rename = "name"` - Field name in the schema (`#[serde(rename)]` is honoured too)
/// - `skip` - Leave the field out (`#[serde(skip)]` is honoured too)
#[proc_macro_derive(SettingsSchema, attributes(setting))]
pub fn derive_settings_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "SettingsSchema can only be derived for structs with named fields.\n\nExample:\n  #[derive(SettingsSchema)]\n  struct MySettings {\n      field: Type,\n  }",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "SettingsSchema can only be derived for structs.\n\nTry: #[derive(SettingsSchema)] on a struct, not an enum or union.",
            ));
        }
    };

    let mut errors: Option<syn::Error> = None;
    let mut field_specs = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        match field_spec(ident, &field.ty, &field.attrs) {
            Ok(Some(spec)) => field_specs.push(spec),
            Ok(None) => {}
            Err(e) => match &mut errors {
                Some(all) => all.combine(e),
                None => errors = Some(e),
            },
        }
    }

    if let Some(errors) = errors {
        return Err(errors);
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::settings_secrets::SettingsSchema for #name #ty_generics #where_clause {
            fn schema() -> ::settings_secrets::Schema {
                ::settings_secrets::Schema::new()
                    #(.field(#field_specs))*
            }
        }
    })
}

/// Build the `FieldSpec` expression for one field, `None` if skipped
fn field_spec(
    ident: &syn::Ident,
    ty: &Type,
    attrs: &[Attribute],
) -> syn::Result<Option<TokenStream2>> {
    let serde = parse_serde_attrs(attrs)?;
    let setting = parse_field_attrs(attrs)?;

    if setting.skip || serde.skip {
        return Ok(None);
    }

    let name = setting
        .rename
        .or(serde.rename)
        .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());

    let (inner_ty, optional) = match option_inner(ty) {
        Some(inner) => (inner, true),
        None => (ty, false),
    };
    let kind = FieldKind::of(inner_ty);

    let mut spec = match kind {
        FieldKind::Nested => quote! {
            ::settings_secrets::FieldSpec::nested(
                #name,
                <#inner_ty as ::settings_secrets::SettingsSchema>::schema(),
            )
        },
        FieldKind::Simple(constructor) => {
            let constructor = syn::Ident::new(constructor, proc_macro2::Span::call_site());
            quote! { ::settings_secrets::FieldSpec::#constructor(#name) }
        }
    };

    if optional {
        spec.extend(quote! { .optional() });
    }

    match setting.default {
        Some(DefaultAttr::Expr(expr)) => spec.extend(quote! { .default_value(#expr) }),
        Some(DefaultAttr::Empty(path)) => {
            if kind != FieldKind::Nested {
                return Err(syn::Error::new_spanned(
                    path,
                    "bare #[setting(default)] is only supported on nested fields.\n\nUse a value instead: #[setting(default = 42)]",
                ));
            }
            spec.extend(quote! { .default_empty() });
        }
        None => {}
    }

    for (method, value) in [
        ("secret_name", &setting.secret_name),
        ("secret_name_env", &setting.secret_name_env),
        ("secret_version", &setting.secret_version),
        ("secret_version_env", &setting.secret_version_env),
    ] {
        if let Some(value) = value {
            let method = syn::Ident::new(method, proc_macro2::Span::call_site());
            spec.extend(quote! { .#method(#value) });
        }
    }

    if let Some(desc) = &setting.description {
        spec.extend(quote! { .meta_str(::settings_secrets::meta::DESCRIPTION, #desc) });
    }
    if let Some(min) = setting.min {
        spec.extend(quote! { .min(#min) });
    }
    if let Some(max) = setting.max {
        spec.extend(quote! { .max(#max) });
    }
    if let Some(pattern) = &setting.pattern {
        spec.extend(quote! { .pattern(#pattern) });
    }

    Ok(Some(spec))
}

// =============================================================================
// Type classification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// Name of the `FieldSpec` constructor
    Simple(&'static str),
    Nested,
}

impl FieldKind {
    fn of(ty: &Type) -> Self {
        match ty {
            Type::Path(path) if path.qself.is_none() => {
                let Some(segment) = path.path.segments.last() else {
                    return FieldKind::Simple("json");
                };
                match segment.ident.to_string().as_str() {
                    "bool" => FieldKind::Simple("toggle"),
                    "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32"
                    | "u64" | "u128" | "usize" => FieldKind::Simple("integer"),
                    "f32" | "f64" => FieldKind::Simple("number"),
                    "String" | "str" | "char" | "PathBuf" | "Path" => FieldKind::Simple("text"),
                    "Vec" | "VecDeque" | "HashSet" | "BTreeSet" => FieldKind::Simple("list"),
                    "HashMap" | "BTreeMap" | "Value" => FieldKind::Simple("json"),
                    _ if matches!(segment.arguments, PathArguments::None) => FieldKind::Nested,
                    _ => FieldKind::Simple("json"),
                }
            }
            Type::Reference(reference) => FieldKind::of(&reference.elem),
            Type::Group(group) => FieldKind::of(&group.elem),
            Type::Paren(paren) => FieldKind::of(&paren.elem),
            _ => FieldKind::Simple("json"),
        }
    }
}

/// `T` if `ty` is `Option<T>`
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

// =============================================================================
// Attribute parsing
// =============================================================================

enum DefaultAttr {
    Expr(Expr),
    /// Bare `default`, keeps the path for error spans
    Empty(syn::Path),
}

/// Field-level attributes from #[setting(...)]
#[derive(Default)]
struct FieldAttrs {
    secret_name: Option<String>,
    secret_name_env: Option<String>,
    secret_version: Option<String>,
    secret_version_env: Option<String>,
    default: Option<DefaultAttr>,
    description: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<String>,
    rename: Option<String>,
    skip: bool,
}

/// The subset of #[serde(...)] that changes the schema
#[derive(Default)]
struct SerdeAttrs {
    rename: Option<String>,
    skip: bool,
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("setting")) {
        let nested = attr.parse_args_with(Punctuated::<Meta, syn::Token![,]>::parse_terminated)?;

        for meta in nested {
            match meta {
                Meta::Path(path) => {
                    if path.is_ident("skip") {
                        result.skip = true;
                    } else if path.is_ident("default") {
                        result.default = Some(DefaultAttr::Empty(path));
                    } else {
                        return Err(syn::Error::new_spanned(
                            path,
                            "unknown #[setting] flag; expected `skip` or `default`",
                        ));
                    }
                }
                Meta::NameValue(nv) => {
                    let Some(key) = nv.path.get_ident().map(ToString::to_string) else {
                        return Err(syn::Error::new_spanned(nv.path, "expected a plain key"));
                    };
                    let value = nv.value;
                    match key.as_str() {
                        "secret_name" => result.secret_name = Some(lit_str(&key, &value)?),
                        "secret_name_env" => result.secret_name_env = Some(lit_str(&key, &value)?),
                        "secret_version" => result.secret_version = Some(lit_str(&key, &value)?),
                        "secret_version_env" => {
                            result.secret_version_env = Some(lit_str(&key, &value)?);
                        }
                        "description" => result.description = Some(lit_str(&key, &value)?),
                        "pattern" => result.pattern = Some(lit_str(&key, &value)?),
                        "rename" => result.rename = Some(lit_str(&key, &value)?),
                        "min" => result.min = Some(lit_f64(&key, &value)?),
                        "max" => result.max = Some(lit_f64(&key, &value)?),
                        "default" => result.default = Some(DefaultAttr::Expr(value)),
                        _ => {
                            return Err(syn::Error::new_spanned(
                                nv.path,
                                format!("unknown #[setting] key `{key}`"),
                            ));
                        }
                    }
                }
                Meta::List(list) => {
                    return Err(syn::Error::new_spanned(
                        list,
                        "unexpected list in #[setting]; use `key = value`",
                    ));
                }
            }
        }
    }

    Ok(result)
}

fn parse_serde_attrs(attrs: &[Attribute]) -> syn::Result<SerdeAttrs> {
    let mut result = SerdeAttrs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        // Serde validates its own syntax; anything unparseable here is not ours
        let Ok(nested) = attr.parse_args_with(Punctuated::<Meta, syn::Token![,]>::parse_terminated)
        else {
            continue;
        };
        for meta in nested {
            match meta {
                Meta::Path(path) if path.is_ident("skip") || path.is_ident("skip_deserializing") => {
                    result.skip = true;
                }
                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    result.rename = Some(lit_str("rename", &nv.value)?);
                }
                Meta::List(list) if list.path.is_ident("rename") => {
                    // rename(deserialize = "...") is the name settings are read under
                    let inner =
                        list.parse_args_with(Punctuated::<Meta, syn::Token![,]>::parse_terminated)?;
                    for meta in inner {
                        if let Meta::NameValue(nv) = meta {
                            if nv.path.is_ident("deserialize") {
                                result.rename = Some(lit_str("rename", &nv.value)?);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok(result)
}

fn lit_str(key: &str, value: &Expr) -> syn::Result<String> {
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        _ => Err(syn::Error::new_spanned(
            value,
            format!("#[setting({key})] must be a string literal.\n\nExample: #[setting({key} = \"...\")]"),
        )),
    }
}

fn lit_f64(key: &str, value: &Expr) -> syn::Result<f64> {
    let invalid = || {
        syn::Error::new_spanned(
            value,
            format!("#[setting({key})] must be a number.\n\nExample: #[setting({key} = 0)]"),
        )
    };
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Float(f), ..
        }) => f.base10_parse().map_err(|_| invalid()),
        Expr::Lit(ExprLit { lit: Lit::Int(i), .. }) => {
            i.base10_parse::<i64>().map(|v| v as f64).map_err(|_| invalid())
        }
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => lit_f64(key, expr).map(|v| -v),
        _ => Err(invalid()),
    }
}
