//! A tabular snapshot of the registered services.
//!
//! Rendering is left to the caller; rows serialize with serde.

use serde::Serialize;
use wirebox_support::rendering::shorten_type_name;

use crate::attribute::{ALIAS, AttributeValue, Tag};
use crate::metadata::{MetadataIndex, is_builtin};
use crate::provider::AggregateProvider;

/// One registered service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub id: String,
    /// Name of the provider that supplied the factory.
    pub module: String,
    /// The factory's output type, without module paths.
    pub return_type: String,
    pub tags: Vec<Tag>,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    /// Kinds of the other attributes.
    pub attributes: Vec<String>,
}

/// One row per registered id, in registration order.
pub(crate) fn rows(providers: &AggregateProvider, metadata: &dyn MetadataIndex) -> Vec<ReportRow> {
    providers
        .iter()
        .map(|(id, factory)| {
            let attributes = metadata.attributes_of(id, None);
            ReportRow {
                id: id.to_string(),
                module: providers.module_of(id).unwrap_or_default().to_owned(),
                return_type: shorten_type_name(factory.output().type_name()),
                tags: metadata.tags_of(id),
                description: metadata.description_of(id),
                aliases: attributes
                    .iter()
                    .filter(|attribute| attribute.kind() == ALIAS)
                    .filter_map(|attribute| attribute.property("name").and_then(AttributeValue::as_str))
                    .map(str::to_owned)
                    .collect(),
                attributes: attributes
                    .iter()
                    .filter(|attribute| !is_builtin(attribute))
                    .map(|attribute| attribute.kind().to_owned())
                    .collect(),
            }
        })
        .collect()
}
