//! `#[derive(Autowire)]`.

use darling::ast::{Data, NestedMeta, Style};
use darling::util::Ignored;
use darling::{FromDeriveInput, FromField, FromMeta};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{DeriveInput, Expr, ExprLit, ExprUnary, GenericArgument, Ident, Lit, Meta, PathArguments, Type, UnOp};

#[derive(FromDeriveInput)]
#[darling(attributes(autowire), supports(struct_any))]
struct AutowireInput {
    ident: Ident,
    generics: syn::Generics,
    data: Data<Ignored, AutowireField>,
    /// Implement the trait but do not register with the catalog.
    #[darling(default)]
    no_catalog: bool,
}

#[derive(FromField)]
#[darling(attributes(autowire))]
struct AutowireField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    id: Option<String>,
    #[darling(default)]
    tagged: Option<String>,
    #[darling(default)]
    with_attr: Option<WithAttr>,
    #[darling(default)]
    default: bool,
    #[darling(default)]
    skip: bool,
}

/// `with_attr = "kind"` or `with_attr(kind = "..", key = value, ..)`.
struct WithAttr {
    kind: String,
    properties: Vec<(String, TokenStream)>,
}

impl FromMeta for WithAttr {
    fn from_string(value: &str) -> darling::Result<Self> {
        Ok(Self {
            kind: value.to_owned(),
            properties: Vec::new(),
        })
    }

    fn from_list(items: &[NestedMeta]) -> darling::Result<Self> {
        let mut kind = None;
        let mut properties = Vec::new();
        let mut errors = darling::Error::accumulator();

        for item in items {
            let NestedMeta::Meta(Meta::NameValue(pair)) = item else {
                errors.push(darling::Error::custom("expected `key = value`").with_span(item));
                continue;
            };
            let Some(key) = pair.path.get_ident().map(Ident::to_string) else {
                errors.push(darling::Error::custom("expected a plain key").with_span(&pair.path));
                continue;
            };
            if key == "kind" {
                match &pair.value {
                    Expr::Lit(ExprLit { lit: Lit::Str(lit), .. }) => kind = Some(lit.value()),
                    other => errors.push(darling::Error::custom("`kind` must be a string").with_span(other)),
                }
                continue;
            }
            match property_value(&pair.value) {
                Ok(value) => properties.push((key, value)),
                Err(err) => errors.push(err),
            }
        }

        let kind = match kind {
            Some(kind) => kind,
            None => {
                errors.push(darling::Error::missing_field("kind"));
                String::new()
            }
        };
        errors.finish_with(Self { kind, properties })
    }
}

/// A string, integer or bool literal as an `AttributeValue` argument.
fn property_value(expr: &Expr) -> darling::Result<TokenStream> {
    let int = |lit: &syn::LitInt, negative: bool| -> darling::Result<TokenStream> {
        let value = lit.base10_parse::<i64>()?;
        let value = if negative { -value } else { value };
        let lit = syn::LitInt::new(&format!("{value}i64"), lit.span());
        Ok(quote!(#lit))
    };
    match expr {
        Expr::Lit(ExprLit { lit: Lit::Str(lit), .. }) => Ok(quote!(#lit)),
        Expr::Lit(ExprLit { lit: Lit::Bool(lit), .. }) => Ok(quote!(#lit)),
        Expr::Lit(ExprLit { lit: Lit::Int(lit), .. }) => int(lit, false),
        Expr::Unary(ExprUnary { op: UnOp::Neg(_), expr, .. }) => match expr.as_ref() {
            Expr::Lit(ExprLit { lit: Lit::Int(lit), .. }) => int(lit, true),
            other => Err(darling::Error::custom("expected an integer").with_span(other)),
        },
        other => Err(darling::Error::custom("property values must be string, integer or bool literals").with_span(other)),
    }
}

/// How a field's type maps onto a parameter.
enum Shape<'a> {
    /// `Arc<T>`
    Single(&'a Type),
    /// `Option<Arc<T>>`
    Optional(&'a Type),
    /// `Vec<Arc<T>>`
    Many(&'a Type),
}

impl<'a> Shape<'a> {
    fn of(ty: &'a Type) -> Option<Self> {
        if let Some(inner) = generic_arg(ty, "Arc") {
            return Some(Self::Single(inner));
        }
        if let Some(inner) = generic_arg(ty, "Option").and_then(|ty| generic_arg(ty, "Arc")) {
            return Some(Self::Optional(inner));
        }
        generic_arg(ty, "Vec")
            .and_then(|ty| generic_arg(ty, "Arc"))
            .map(Self::Many)
    }

    fn inner(&self) -> &'a Type {
        match self {
            Self::Single(ty) | Self::Optional(ty) | Self::Many(ty) => ty,
        }
    }
}

/// The single type argument of `Wrapper<T>`, if `ty` is one.
fn generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
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

pub(crate) fn expand(input: TokenStream) -> darling::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let input = AutowireInput::from_derive_input(&input)?;
    let ident = &input.ident;

    let Data::Struct(fields) = &input.data else {
        return Err(darling::Error::unsupported_shape("enum").with_span(ident));
    };

    let mut errors = darling::Error::accumulator();
    let mut params = Vec::new();
    let mut values = Vec::new();
    let mut variadic_seen = false;

    for (index, field) in fields.fields.iter().enumerate() {
        if field.skip {
            values.push(quote!(::core::default::Default::default()));
            continue;
        }

        let Some(shape) = Shape::of(&field.ty) else {
            errors.push(
                darling::Error::custom(
                    "fields must be Arc<T>, Option<Arc<T>> or Vec<Arc<T>>; use #[autowire(skip)] for anything else",
                )
                .with_span(&field.ty),
            );
            continue;
        };

        if variadic_seen {
            errors.push(
                darling::Error::custom("a Vec<Arc<T>> field must be the last parameter").with_span(&field.ty),
            );
        }
        if let Err(err) = check_markers(field, &shape) {
            errors.push(err);
        }

        let position = params.len();
        let name = field
            .ident
            .as_ref()
            .map_or_else(|| index.to_string(), |ident| ident.to_string());
        params.push(param(field, &shape, &name));
        values.push(value(&shape, position));
        variadic_seen |= matches!(shape, Shape::Many(_));
    }

    errors.finish()?;

    let construct = match fields.style {
        Style::Struct => {
            let names = fields.fields.iter().filter_map(|field| field.ident.as_ref());
            quote!(Self { #(#names: #values),* })
        }
        Style::Tuple => quote!(Self(#(#values),*)),
        Style::Unit => quote!(Self),
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let implementation = quote! {
        impl #impl_generics ::wirebox::Autowire for #ident #ty_generics #where_clause {
            fn signature() -> ::wirebox::Signature {
                ::wirebox::Signature::new() #(.param(#params))*
            }

            #[allow(unused_variables)]
            fn construct(args: &::wirebox::Arguments) -> ::wirebox::Result<Self> {
                ::core::result::Result::Ok(#construct)
            }
        }
    };

    if input.no_catalog {
        return Ok(implementation);
    }
    if !input.generics.params.is_empty() {
        return Err(darling::Error::custom(
            "generic types cannot be cataloged; add #[autowire(no_catalog)] and register each instantiation",
        )
        .with_span(&input.generics));
    }

    Ok(quote! {
        #implementation

        ::wirebox::inventory::submit! {
            ::wirebox::Constructor::of::<#ident>()
        }
    })
}

fn check_markers(field: &AutowireField, shape: &Shape<'_>) -> darling::Result<()> {
    let markers = [field.id.is_some(), field.tagged.is_some(), field.with_attr.is_some()]
        .into_iter()
        .filter(|&set| set)
        .count();
    if markers > 1 {
        return Err(
            darling::Error::custom("use at most one of `id`, `tagged` and `with_attr`").with_span(&field.ty),
        );
    }
    if field.default && matches!(shape, Shape::Many(_)) {
        return Err(darling::Error::custom("a variadic parameter cannot have a default").with_span(&field.ty));
    }
    Ok(())
}

fn param(field: &AutowireField, shape: &Shape<'_>, name: &str) -> TokenStream {
    let inner = shape.inner();
    let mut param = quote!(::wirebox::Param::of::<#inner>(#name));

    match shape {
        Shape::Single(_) => {}
        Shape::Optional(_) => param = quote!(#param.nullable()),
        Shape::Many(_) => param = quote!(#param.variadic()),
    }
    if let Some(id) = &field.id {
        param = quote!(#param.id(#id));
    }
    if let Some(tag) = &field.tagged {
        param = quote!(#param.tagged(#tag));
    }
    if let Some(WithAttr { kind, properties }) = &field.with_attr {
        let matching = properties.iter().map(|(key, value)| quote!(.matching(#key, #value)));
        param = quote!(#param.with_attr(::wirebox::AttributeFilter::new(#kind) #(#matching)*));
    }
    if field.default {
        param = quote! {
            #param.with_default(|| ::std::sync::Arc::new(<#inner as ::core::default::Default>::default()))
        };
    }
    param
}

fn value(shape: &Shape<'_>, position: usize) -> TokenStream {
    let inner = shape.inner();
    let position = syn::LitInt::new(&position.to_string(), Span::call_site());
    match shape {
        Shape::Single(_) => quote!(args.get::<#inner>(#position)?),
        Shape::Optional(_) => quote!(args.optional::<#inner>(#position)?),
        Shape::Many(_) => quote!(args.variadic::<#inner>(#position)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_ok(input: TokenStream) -> String {
        expand(input).unwrap().to_string().replace(' ', "")
    }

    fn expand_err(input: TokenStream) -> String {
        expand(input).unwrap_err().to_string()
    }

    #[test]
    fn named_fields_become_parameters_in_order() {
        let output = expand_ok(quote! {
            struct Mailer {
                transport: Arc<Transport>,
                audit: Option<Arc<Audit>>,
                #[autowire(tagged = "filter")]
                filters: Vec<Arc<dyn Filter>>,
            }
        });

        assert!(output.contains("Param::of::<Transport>(\"transport\")"));
        assert!(output.contains(".nullable()"));
        assert!(output.contains(".variadic().tagged(\"filter\")"));
        assert!(output.contains("args.variadic::<dynFilter>(2)?"));
        assert!(output.contains("inventory::submit!"));
    }

    #[test]
    fn skipped_fields_use_default() {
        let output = expand_ok(quote! {
            #[autowire(no_catalog)]
            struct Counter(Arc<Clock>, #[autowire(skip)] u64);
        });

        assert!(output.contains("Self(args.get::<Clock>(0)?"));
        assert!(output.contains("::core::default::Default::default()"));
        assert!(!output.contains("submit"));
    }

    #[test]
    fn unit_struct_has_empty_signature() {
        let output = expand_ok(quote!(struct Marker;));
        assert!(output.contains("::wirebox::Signature::new()"));
        assert!(output.contains("Ok(Self)"));
    }

    #[test]
    fn unsupported_field_type() {
        let err = expand_err(quote! {
            struct Config {
                port: u16,
            }
        });
        assert!(err.contains("autowire(skip)"));
    }

    #[test]
    fn variadic_must_be_last() {
        let err = expand_err(quote! {
            struct Pipeline {
                stages: Vec<Arc<dyn Stage>>,
                sink: Arc<Sink>,
            }
        });
        assert!(err.contains("last parameter"));
    }

    #[test]
    fn conflicting_markers() {
        let err = expand_err(quote! {
            struct Report {
                #[autowire(id = "db", tagged = "db")]
                db: Arc<Db>,
            }
        });
        assert!(err.contains("at most one"));
    }

    #[test]
    fn attribute_filter_with_properties() {
        let output = expand_ok(quote! {
            struct Router {
                #[autowire(with_attr(kind = "route", method = "GET", version = 2, internal = false))]
                handlers: Vec<Arc<dyn Handler>>,
                #[autowire(with_attr = "fallback")]
                fallback: Option<Arc<dyn Handler>>,
            }
        });

        assert!(output.contains(
            "AttributeFilter::new(\"route\").matching(\"method\",\"GET\").matching(\"version\",2i64).matching(\"internal\",false)"
        ));
        assert!(output.contains("AttributeFilter::new(\"fallback\"))"));
    }

    #[test]
    fn attribute_filter_needs_a_kind() {
        let err = expand_err(quote! {
            struct Router {
                #[autowire(with_attr(method = "GET"))]
                handlers: Vec<Arc<dyn Handler>>,
            }
        });
        assert!(err.contains("kind"));
    }

    #[test]
    fn generic_struct_needs_no_catalog() {
        let err = expand_err(quote! {
            struct Holder<T: Send + Sync + 'static> {
                value: Arc<T>,
            }
        });
        assert!(err.contains("no_catalog"));
    }

    #[test]
    fn enums_are_rejected() {
        assert!(expand(quote!(enum Choice { A, B })).is_err());
    }
}
