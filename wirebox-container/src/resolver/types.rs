//! Strategies driven by a parameter's declared type.

use tracing::trace;

use super::{ParameterResolver, ResolutionContext, open_params};
use crate::error::Result;
use crate::signature::Signature;
use crate::value::{Argument, Arguments};

/// Resolves the declared type's id when the container has a factory for
/// it or can autowire it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeHint;

impl ParameterResolver for TypeHint {
    fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        signature: &Signature,
        resolved: &mut Arguments,
    ) -> Result<()> {
        for (position, param) in open_params(signature, resolved) {
            let Some(ty) = param.declared_type() else {
                continue;
            };

            if ctx.container.has(ty.id()) || ctx.container.can_autowire(ty.id()) {
                resolved.fill(position, Argument::Value(ctx.get(ty.id())?));
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "type_hint"
    }
}

/// Builds a declared type directly when none of its own parameters needs
/// a dependency.
///
/// The instance is built from defaults alone. It is neither registered nor
/// cached, so each parameter gets its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependents;

impl ParameterResolver for NoDependents {
    fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        signature: &Signature,
        resolved: &mut Arguments,
    ) -> Result<()> {
        for (position, param) in open_params(signature, resolved) {
            let Some(constructor) = param.declared_type().and_then(|ty| ty.constructor()) else {
                continue;
            };

            let own = constructor.signature();
            if !own.has_no_dependencies() {
                continue;
            }

            let mut args = Arguments::new();
            for (index, own_param) in own.params().iter().enumerate() {
                if let Some(default) = own_param.default_value() {
                    args.fill(index, Argument::Value(default()));
                } else if own_param.is_nullable() {
                    args.fill(index, Argument::Null);
                }
            }

            trace!(owner = %ctx.owner, ty = constructor.type_name(), "Building dependency-free type");
            resolved.fill(position, Argument::Value(constructor.build(&args)?));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "no_dependents"
    }
}
