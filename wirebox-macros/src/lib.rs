//! Procedural macros for wirebox.
//!
//! - `#[derive(Autowire)]`: declares a struct's constructor signature and
//!   registers it with the container's type catalog
//! - `#[forward]`: lets a trait's services be replaced by a forwarding
//!   stand-in while a dependency cycle through them is being built
//!
//! Generated code refers to the `wirebox` facade crate.

use proc_macro::TokenStream;

mod autowire;
mod forward;

/// Implements `wirebox::Autowire` from the struct's fields.
///
/// | Field type       | Parameter            |
/// |------------------|----------------------|
/// | `Arc<T>`         | typed                |
/// | `Option<Arc<T>>` | typed, nullable      |
/// | `Vec<Arc<T>>`    | typed, variadic      |
///
/// Field attributes: `#[autowire(id = "..")]`, `#[autowire(tagged = "..")]`,
/// `#[autowire(with_attr = "..")]` or
/// `#[autowire(with_attr(kind = "..", key = value, ..))]` to also match
/// properties, `#[autowire(default)]` (uses
/// `T::default()` when nothing resolves) and `#[autowire(skip)]` (not a
/// parameter, filled with `Default::default()`).
///
/// Unless the struct says `#[autowire(no_catalog)]`, a constructor is
/// submitted to the catalog so containers can build the type without a
/// factory.
#[proc_macro_derive(Autowire, attributes(autowire))]
pub fn derive_autowire(input: TokenStream) -> TokenStream {
    autowire::expand(input.into())
        .unwrap_or_else(|err| err.write_errors())
        .into()
}

/// Makes a trait forwardable: generates `impl Trait for StandIn<dyn Trait>`
/// and `impl Forward for dyn Trait`.
///
/// Every method must take `&self`. The trait must be `Send + Sync`.
#[proc_macro_attribute]
pub fn forward(args: TokenStream, input: TokenStream) -> TokenStream {
    forward::expand(args.into(), input.into())
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
