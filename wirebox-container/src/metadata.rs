//! Metadata lookup by id and by tag or attribute.

use std::collections::HashMap;

use crate::attribute::{ALIAS, Attribute, AttributeValue, DESCRIPTION, TAG, Tag};
use crate::callable::Factory;
use crate::id::ServiceId;

/// Answers metadata questions about registered services.
///
/// Results that list ids are in registration order unless stated otherwise.
pub trait MetadataIndex: Send + Sync {
    /// Tags declared on `id`, in declaration order.
    fn tags_of(&self, id: &ServiceId) -> Vec<Tag>;

    /// Ids carrying `tag`, ascending by priority, ties in registration order.
    fn ids_with_tag(&self, tag: &str) -> Vec<ServiceId>;

    /// Ids with at least one attribute of `kind` accepted by `predicate`.
    fn ids_with_attribute(
        &self,
        kind: &str,
        predicate: Option<&dyn Fn(&Attribute) -> bool>,
    ) -> Vec<ServiceId>;

    fn description_of(&self, id: &ServiceId) -> Option<String>;

    /// Attributes of `id`, optionally only those of `kind`.
    fn attributes_of(&self, id: &ServiceId, kind: Option<&str>) -> Vec<Attribute>;
}

/// [`MetadataIndex`] over the attributes declared on factories.
#[derive(Debug, Default)]
pub struct AttributeMap {
    order: Vec<ServiceId>,
    attributes: HashMap<ServiceId, Vec<Attribute>>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes factories in the given (registration) order.
    pub fn from_factories<'a>(factories: impl IntoIterator<Item = (&'a ServiceId, &'a Factory)>) -> Self {
        let mut map = Self::new();
        for (id, factory) in factories {
            map.insert(id.clone(), factory.attributes().to_vec());
        }
        map
    }

    /// Sets the attributes of `id`, keeping its first registration position.
    pub fn insert(&mut self, id: ServiceId, attributes: Vec<Attribute>) {
        if !self.attributes.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.attributes.insert(id, attributes);
    }

    /// `(alias, target)` pairs in registration order.
    pub fn aliases(&self) -> Vec<(ServiceId, ServiceId)> {
        self.entries()
            .flat_map(|(id, attributes)| {
                attributes
                    .iter()
                    .filter(|attribute| attribute.kind() == ALIAS)
                    .filter_map(|attribute| attribute.property("name").and_then(AttributeValue::as_str))
                    .map(move |alias| (ServiceId::new(alias), id.clone()))
            })
            .collect()
    }

    fn entries(&self) -> impl Iterator<Item = (&ServiceId, &[Attribute])> {
        self.order
            .iter()
            .filter_map(|id| self.attributes.get(id).map(|attributes| (id, attributes.as_slice())))
    }
}

impl MetadataIndex for AttributeMap {
    fn tags_of(&self, id: &ServiceId) -> Vec<Tag> {
        self.attributes
            .get(id)
            .map(|attributes| attributes.iter().filter_map(Attribute::as_tag).collect())
            .unwrap_or_default()
    }

    fn ids_with_tag(&self, tag: &str) -> Vec<ServiceId> {
        let mut tagged: Vec<(i64, usize, &ServiceId)> = self
            .entries()
            .enumerate()
            .filter_map(|(position, (id, attributes))| {
                attributes
                    .iter()
                    .filter_map(Attribute::as_tag)
                    .find(|t| t.name == tag)
                    .map(|t| (t.priority, position, id))
            })
            .collect();

        tagged.sort_by_key(|&(priority, position, _)| (priority, position));
        tagged.into_iter().map(|(_, _, id)| id.clone()).collect()
    }

    fn ids_with_attribute(
        &self,
        kind: &str,
        predicate: Option<&dyn Fn(&Attribute) -> bool>,
    ) -> Vec<ServiceId> {
        self.entries()
            .filter(|(_, attributes)| {
                attributes
                    .iter()
                    .any(|attribute| attribute.kind() == kind && predicate.is_none_or(|accept| accept(attribute)))
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn description_of(&self, id: &ServiceId) -> Option<String> {
        self.attributes
            .get(id)?
            .iter()
            .filter(|attribute| attribute.kind() == DESCRIPTION)
            .find_map(|attribute| attribute.property("text").map(ToString::to_string))
    }

    fn attributes_of(&self, id: &ServiceId, kind: Option<&str>) -> Vec<Attribute> {
        self.attributes
            .get(id)
            .map(|attributes| {
                attributes
                    .iter()
                    .filter(|attribute| kind.is_none_or(|kind| attribute.kind() == kind))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Whether `attribute` is one of the kinds the container itself interprets.
pub(crate) fn is_builtin(attribute: &Attribute) -> bool {
    matches!(attribute.kind(), TAG | DESCRIPTION | ALIAS)
}
