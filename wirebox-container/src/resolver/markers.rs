//! Strategies driven by a parameter's [`Marker`].

use std::any::type_name;

use super::{ParameterResolver, ResolutionContext, open_params};
use crate::attribute::Attribute;
use crate::error::{Result, WireError};
use crate::id::ServiceId;
use crate::signature::{Marker, Param, Signature};
use crate::value::{Argument, Arguments, Service, ServiceList, unwrap};

/// `Param::id`: resolves the named service.
///
/// A variadic parameter expects the service to be a [`ServiceList`] and
/// spreads its elements over successive positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitId;

impl ParameterResolver for ExplicitId {
    fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        signature: &Signature,
        resolved: &mut Arguments,
    ) -> Result<()> {
        for (position, param) in open_params(signature, resolved) {
            let Some(Marker::Id(id)) = param.marker() else {
                continue;
            };

            let value = ctx.get(id)?;
            if param.is_variadic() {
                let list = unwrap::<ServiceList>(&value).ok_or_else(|| WireError::TypeMismatch {
                    id: id.clone(),
                    expected: type_name::<ServiceList>(),
                })?;
                resolved.spread(position, list.iter().cloned());
            } else {
                resolved.fill(position, Argument::Value(value));
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "explicit_id"
    }
}

/// `Param::with_attr`: resolves every service with a matching attribute,
/// in registration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeMatch;

impl ParameterResolver for AttributeMatch {
    fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        signature: &Signature,
        resolved: &mut Arguments,
    ) -> Result<()> {
        for (position, param) in open_params(signature, resolved) {
            let Some(Marker::WithAttr(filter)) = param.marker() else {
                continue;
            };

            let matches = |attribute: &Attribute| filter.matches(attribute);
            let ids = ctx.container.ids_with_attribute(filter.kind(), Some(&matches));
            inject(ctx, param, position, &ids, resolved)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "attribute_match"
    }
}

/// `Param::tagged`: resolves every service carrying the tag, ascending by
/// priority with ties in registration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tagged;

impl ParameterResolver for Tagged {
    fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        signature: &Signature,
        resolved: &mut Arguments,
    ) -> Result<()> {
        for (position, param) in open_params(signature, resolved) {
            let Some(Marker::Tagged(tag)) = param.marker() else {
                continue;
            };

            let ids = ctx.container.ids_with_tag(tag);
            inject(ctx, param, position, &ids, resolved)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tagged"
    }
}

/// Variadic parameters take every match from `position` on; others take
/// the first match only, so following parameters keep their positions.
fn inject(
    ctx: &ResolutionContext<'_>,
    param: &Param,
    position: usize,
    ids: &[ServiceId],
    resolved: &mut Arguments,
) -> Result<()> {
    if param.is_variadic() {
        let values: Vec<Service> = ctx.get_all(ids)?;
        resolved.spread(position, values);
    } else if let Some(first) = ids.first() {
        resolved.fill(position, Argument::Value(ctx.get(first)?));
    }
    Ok(())
}
