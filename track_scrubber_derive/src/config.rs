use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote, quote_spanned, ToTokens};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, GenericArgument, PathArguments, Type};

pub fn expand_derive_from_service_config(
    input: &DeriveInput,
) -> Result<TokenStream, Vec<syn::Error>> {
    let name = &input.ident;
    let setters = config_setters(input)?;
    let expanded = quote! {
        impl FromServiceConfig for #name {
            fn from_config(config: &ServiceConfig) -> Result<Self, Error> {
                let mut base = Self::default();
                for key in config.parameters() {
                    match key.as_ref() {
                        #setters
                        _ => log::warn!(
                            "unknown configuration parameter for {}: {}={:?}",
                            stringify!(#name),
                            key,
                            config.get_parameter(key)
                        ),
                    }
                }
                Ok(base)
            }
        }
    };

    Ok(expanded)
}

/// Generate a match arm for each field that isn't annotated with #[service_config(skip)]
fn config_setters(input: &DeriveInput) -> Result<TokenStream, Vec<syn::Error>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(vec![syn::Error::new(
                    input.span(),
                    "FromServiceConfig requires a struct with named fields",
                )])
            }
        },
        _ => {
            return Err(vec![syn::Error::new(
                input.span(),
                "FromServiceConfig can only be derived for structs",
            )])
        }
    };

    let mut errors = Vec::new();
    let mut arms = Vec::new();
    for field in fields {
        match skip_field(field) {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                errors.push(e);
                continue;
            }
        }
        match generate_setter(field) {
            Ok(arm) => arms.push(arm),
            Err(e) => errors.push(e),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    if arms.is_empty() {
        arms.push(quote! {"" => continue});
    }
    Ok(quote! {
        #(#arms),*,
    })
}

fn skip_field(field: &Field) -> Result<bool, syn::Error> {
    let mut skip = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("service_config") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported service_config attribute, expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}

fn generate_setter(field: &Field) -> Result<TokenStream, syn::Error> {
    let name = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new(field.span(), "field has no name"))?;
    let key = name.to_string();
    let (ty, optional) = match option_inner_type(&field.ty) {
        Some(inner) => (inner, true),
        None => (&field.ty, false),
    };
    let (get_fn, cast) = get_param_fn_ident(ty)?;

    let value = if let Some(cast) = cast {
        quote_spanned! { field.span() => val? as #cast }
    } else {
        quote_spanned! { field.span() => val? }
    };
    let assignment = if optional {
        quote_spanned! { field.span() => base.#name = Some(#value) }
    } else {
        quote_spanned! { field.span() => base.#name = #value }
    };

    Ok(quote_spanned! {
        field.span() => #key => {
            if let Some(val) = config.#get_fn(#key) {
                #assignment
            }
        }
    })
}

/// Return `T` when the type is written as `Option<T>`
fn option_inner_type(ty: &Type) -> Option<&Type> {
    let path = match ty {
        Type::Path(ty) if ty.qself.is_none() => &ty.path,
        _ => return None,
    };
    let segment = path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn get_param_fn_ident(ty: &Type) -> Result<(Ident, Option<&Type>), syn::Error> {
    let type_str = ty.to_token_stream().to_string();
    let cast = Some(ty);
    match type_str.as_ref() {
        "String" => Ok((format_ident!("get_parameter_as_string"), None)),
        "bool" => Ok((format_ident!("get_parameter_as_bool"), None)),
        "f32" | "f64" => Ok((format_ident!("get_parameter_as_f64"), cast)),
        "u8" | "u16" | "u32" | "u64" | "usize" | "i8" | "i16" | "i32" | "i64" | "isize" => {
            Ok((format_ident!("get_parameter_as_i64"), cast))
        }
        _ => Err(syn::Error::new(
            ty.span(),
            format!(
                "FromServiceConfig doesn't support fields of type {}, mark it #[service_config(skip)]",
                type_str
            ),
        )),
    }
}
