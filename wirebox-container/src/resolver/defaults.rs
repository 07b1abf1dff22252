use super::{ParameterResolver, ResolutionContext, open_params};
use crate::error::Result;
use crate::signature::Signature;
use crate::value::{Argument, Arguments};

/// Falls back to a declared default, then to null for nullable parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValue;

impl ParameterResolver for DefaultValue {
    fn resolve(
        &self,
        _ctx: &ResolutionContext<'_>,
        signature: &Signature,
        resolved: &mut Arguments,
    ) -> Result<()> {
        for (position, param) in open_params(signature, resolved) {
            if let Some(default) = param.default_value() {
                resolved.fill(position, Argument::Value(default()));
            } else if param.is_nullable() {
                resolved.fill(position, Argument::Null);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "default_value"
    }
}
