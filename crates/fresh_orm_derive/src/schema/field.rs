use super::ErrorSet;
use syn::ext::IdentExt;

#[derive(Debug)]
pub(crate) struct Field {
    /// Rust field identifier
    pub(crate) ident: syn::Ident,

    /// Column name, the identifier without any `r#` prefix
    pub(crate) name: String,

    /// Declared field type
    pub(crate) ty: syn::Type,

    pub(crate) attrs: FieldAttrs,
}

#[derive(Debug, Default)]
pub(crate) struct FieldAttrs {
    /// True if the field is annotated with `#[orm(as_text)]`
    pub(crate) as_text: bool,

    /// True if an `as_text` field is declared as `Option<T>`
    pub(crate) nullable_text: bool,
}

impl Field {
    pub(super) fn from_ast(field: &syn::Field) -> syn::Result<Field> {
        let Some(ident) = &field.ident else {
            return Err(syn::Error::new_spanned(field, "model fields must be named"));
        };

        let mut errs = ErrorSet::new();
        let mut attrs = FieldAttrs::default();

        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("orm")) {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("as_text") {
                    if attrs.as_text {
                        return Err(meta.error("duplicate `as_text` option"));
                    }
                    attrs.as_text = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported field option; expected `as_text`"))
                }
            });
            if let Err(err) = parsed {
                errs.push(err);
            }
        }

        if let Some(err) = errs.collect() {
            return Err(err);
        }

        attrs.nullable_text = attrs.as_text && option_inner(&field.ty).is_some();

        Ok(Field {
            ident: ident.clone(),
            name: ident.unraw().to_string(),
            ty: field.ty.clone(),
            attrs,
        })
    }
}

/// The `T` of a syntactic `Option<T>`, with or without a path prefix.
pub(crate) fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(syn::GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}
