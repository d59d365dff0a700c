use crate::schema::{Field, Model};

use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn model(model: &Model) -> TokenStream {
    let orm = quote!(_fresh_orm);
    let model_ident = &model.ident;
    let type_name = model_ident.to_string();
    let table_name = match &model.table {
        Some(table) => quote!(::core::option::Option::Some(#table)),
        None => quote!(::core::option::Option::None),
    };
    let descriptors = model.fields.iter().map(|field| expand_descriptor(&orm, field));
    let pushes = model.fields.iter().map(expand_push);
    let takes = model.fields.iter().map(expand_take);

    wrap_in_const(quote! {
        #[automatically_derived]
        impl #orm::model::Model for #model_ident {
            const TYPE_NAME: &'static str = #type_name;
            const TABLE_NAME: ::core::option::Option<&'static str> = #table_name;

            fn fields() -> ::std::vec::Vec<#orm::schema::FieldDescriptor> {
                ::std::vec![#( #descriptors ),*]
            }

            fn id(&self) -> ::core::option::Option<i64> {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = ::core::option::Option::Some(id);
            }

            #[allow(unused_mut)]
            fn to_record(&self) -> #orm::codec::CodecResult<#orm::model::Record> {
                let mut record = #orm::model::Record::new(self.id);
                #( #pushes )*
                ::core::result::Result::Ok(record)
            }

            #[allow(unused_mut)]
            fn from_record(
                mut record: #orm::model::Record,
            ) -> #orm::codec::CodecResult<Self> {
                ::core::result::Result::Ok(Self {
                    id: record.id(),
                    #( #takes )*
                })
            }
        }
    })
}

fn expand_descriptor(orm: &TokenStream, field: &Field) -> TokenStream {
    let name = &field.name;
    if field.attrs.as_text {
        let optional = field.attrs.nullable_text;
        quote!(#orm::schema::FieldDescriptor::new(#name, #orm::schema::TypeTag::Text, #optional))
    } else {
        let ty = &field.ty;
        quote!(<#ty as #orm::model::FieldValue>::descriptor(#name))
    }
}

fn expand_push(field: &Field) -> TokenStream {
    let ident = &field.ident;
    let name = &field.name;
    if field.attrs.nullable_text {
        quote!(record.push_optional_text(#name, self.#ident.as_ref())?;)
    } else if field.attrs.as_text {
        quote!(record.push_text(#name, &self.#ident)?;)
    } else {
        quote!(record.push_field(#name, &self.#ident)?;)
    }
}

fn expand_take(field: &Field) -> TokenStream {
    let ident = &field.ident;
    let name = &field.name;
    if field.attrs.nullable_text {
        quote!(#ident: record.take_optional_text(#name)?,)
    } else if field.attrs.as_text {
        quote!(#ident: record.take_text(#name)?,)
    } else {
        quote!(#ident: record.take(#name)?,)
    }
}

fn wrap_in_const(code: TokenStream) -> TokenStream {
    quote! {
        const _: () = {
            use ::fresh_orm_core as _fresh_orm;
            #code
        };
    }
}
