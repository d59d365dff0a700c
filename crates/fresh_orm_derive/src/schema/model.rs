use super::{option_inner, ErrorSet, Field};

/// Name of the field every model must declare as `Option<i64>`.
const ID_FIELD: &str = "id";

#[derive(Debug)]
pub(crate) struct Model {
    /// Type identifier
    pub(crate) ident: syn::Ident,

    /// Optional table name from `#[orm(table = "...")]`
    pub(crate) table: Option<syn::LitStr>,

    /// Non-id fields in declaration order
    pub(crate) fields: Vec<Field>,
}

impl Model {
    pub(crate) fn from_ast(ast: &syn::DeriveInput) -> syn::Result<Model> {
        let syn::Data::Struct(data) = &ast.data else {
            return Err(syn::Error::new_spanned(
                &ast.ident,
                "`Model` can only be derived for structs",
            ));
        };

        let syn::Fields::Named(node) = &data.fields else {
            return Err(syn::Error::new_spanned(
                &data.fields,
                "model fields must be named",
            ));
        };

        if !ast.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &ast.generics,
                "model generics are not supported",
            ));
        }

        let mut errs = ErrorSet::new();
        let table = match parse_table_attr(&ast.attrs) {
            Ok(table) => table,
            Err(err) => {
                errs.push(err);
                None
            }
        };

        let mut has_id = false;
        let mut fields = vec![];

        for node in node.named.iter() {
            let field = match Field::from_ast(node) {
                Ok(field) => field,
                Err(err) => {
                    errs.push(err);
                    continue;
                }
            };

            if field.name != ID_FIELD {
                fields.push(field);
                continue;
            }

            has_id = true;
            if field.attrs.as_text {
                errs.push(syn::Error::new_spanned(
                    node,
                    "`id` cannot be stored as text",
                ));
            }
            if !is_optional_i64(&field.ty) {
                errs.push(syn::Error::new_spanned(
                    &field.ty,
                    "model `id` field must have type `Option<i64>`",
                ));
            }
        }

        if !has_id {
            errs.push(syn::Error::new_spanned(
                &ast.ident,
                "model must have an `id: Option<i64>` field",
            ));
        }

        if let Some(err) = errs.collect() {
            return Err(err);
        }

        Ok(Model {
            ident: ast.ident.clone(),
            table,
            fields,
        })
    }
}

fn parse_table_attr(attrs: &[syn::Attribute]) -> syn::Result<Option<syn::LitStr>> {
    let mut table: Option<syn::LitStr> = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                if table.is_some() {
                    return Err(meta.error("duplicate `table` option"));
                }
                table = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported model option; expected `table = \"table_name\"`"))
            }
        })?;
    }

    Ok(table)
}

/// Syntactic check for `Option<i64>`, with or without a path prefix.
fn is_optional_i64(ty: &syn::Type) -> bool {
    matches!(
        option_inner(ty),
        Some(syn::Type::Path(inner)) if inner.path.is_ident("i64")
    )
}
