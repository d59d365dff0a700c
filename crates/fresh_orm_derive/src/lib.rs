//! `#[derive(Model)]` for `fresh_orm_core`.
//!
//! ```ignore
//! #[derive(Model)]
//! #[orm(table = "items")]
//! struct Item {
//!     id: Option<i64>,
//!     name: String,
//!     category: Related<Category>,
//!     #[orm(as_text)]
//!     addr: std::net::Ipv4Addr,
//! }
//! ```

extern crate proc_macro;

mod expand;
mod schema;

use proc_macro::TokenStream;

#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    match generate(input.into()) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn generate(input: proc_macro2::TokenStream) -> syn::Result<proc_macro2::TokenStream> {
    let item: syn::DeriveInput = syn::parse2(input)?;
    let model = schema::Model::from_ast(&item)?;
    Ok(expand::model(&model))
}
