//! `#[forward]`.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Error, FnArg, Ident, ItemTrait, Pat, PatIdent, PatType, Result, Signature, TraitItem};

pub(crate) fn expand(args: TokenStream, input: TokenStream) -> Result<TokenStream> {
    if !args.is_empty() {
        return Err(Error::new(Span::call_site(), "#[forward] takes no arguments"));
    }
    let item: ItemTrait = syn::parse2(input)?;
    let ident = &item.ident;

    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(&item.generics, "forwarding traits cannot be generic"));
    }

    let methods = item
        .items
        .iter()
        .map(|member| match member {
            TraitItem::Fn(method) => forward_method(ident, &method.sig),
            other => Err(Error::new_spanned(other, "only methods can be forwarded")),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        #item

        impl #ident for ::wirebox::StandIn<dyn #ident> {
            #(#methods)*
        }

        impl ::wirebox::Forward for dyn #ident {
            fn forward(stand_in: ::wirebox::StandIn<Self>) -> ::std::sync::Arc<Self> {
                ::std::sync::Arc::new(stand_in)
            }
        }
    })
}

/// A method body that calls the same method on the stand-in's target.
fn forward_method(trait_ident: &Ident, sig: &Signature) -> Result<TokenStream> {
    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => return Err(Error::new(sig.span(), "forwarded methods must take `&self`")),
    }
    if sig.generics.type_params().next().is_some() {
        return Err(Error::new_spanned(&sig.generics, "forwarded methods cannot have type parameters"));
    }

    let mut sig = sig.clone();
    let mut args: Vec<Ident> = Vec::new();
    for (index, input) in sig.inputs.iter_mut().skip(1).enumerate() {
        if let FnArg::Typed(PatType { pat, .. }) = input {
            let arg = format_ident!("arg{}", index);
            **pat = Pat::Ident(PatIdent {
                attrs: Vec::new(),
                by_ref: None,
                mutability: None,
                ident: arg.clone(),
                subpat: None,
            });
            args.push(arg);
        }
    }

    let method = &sig.ident;
    let call = quote!(#trait_ident::#method(&**self.target(), #(#args),*));
    let body = if sig.unsafety.is_some() {
        quote!(unsafe { #call })
    } else {
        call
    };

    Ok(quote! {
        #sig {
            #body
        }
    })
}
