use super::{ParameterResolver, ResolutionContext};
use crate::error::Result;
use crate::signature::Signature;
use crate::value::Arguments;

/// Takes the caller's positional values as they are.
///
/// Positions past the declared parameters are kept too; a variadic
/// parameter reads them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalOverride;

impl ParameterResolver for PositionalOverride {
    fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        _signature: &Signature,
        resolved: &mut Arguments,
    ) -> Result<()> {
        for (position, argument) in ctx.overrides.iter() {
            resolved.fill(position, argument.clone());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "positional_override"
    }
}
