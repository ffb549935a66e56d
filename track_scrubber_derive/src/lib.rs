//! Define procedural macro to build service handlers from their config entries
#[macro_use]
extern crate syn;
extern crate proc_macro;
extern crate proc_macro2;

use proc_macro::TokenStream;
use quote::quote;
use syn::DeriveInput;

mod config;

/// Generate a `FromServiceConfig` impl that starts from `Default` and overwrites each named
/// field with the matching key of the service configuration. Fields marked with
/// `#[service_config(skip)]` are never read from the configuration.
#[proc_macro_derive(FromServiceConfig, attributes(service_config))]
pub fn derive_from_service_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    config::expand_derive_from_service_config(&input)
        .unwrap_or_else(to_compile_errors)
        .into()
}

fn to_compile_errors(errors: Vec<syn::Error>) -> proc_macro2::TokenStream {
    let compile_errors = errors.iter().map(syn::Error::to_compile_error);
    quote!(#(#compile_errors)*)
}
