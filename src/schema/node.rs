use super::PropertyDefinition;
use crate::data::DataBag;
use serde::{Deserialize, Serialize};

/// The ordered property list of a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSchema {
    pub node_type: String,
    pub display_name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

impl NodeSchema {
    pub fn new(node_type: &str, display_name: &str) -> Self {
        Self {
            node_type: node_type.to_string(),
            display_name: display_name.to_string(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.key == key)
    }

    /// Properties whose length is derived from `count_key`.
    pub fn dependents_of<'a>(
        &'a self,
        count_key: &'a str,
    ) -> impl Iterator<Item = &'a PropertyDefinition> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.count_key.as_deref() == Some(count_key))
    }

    /// A fresh data bag holding every property's default, in schema order.
    pub fn default_bag(&self) -> DataBag {
        self.properties
            .iter()
            .map(|p| (p.key.clone(), p.default_value()))
            .collect()
    }

    /// Checks that every `count_key` and `selection_key` names a property of this schema.
    pub fn dangling_references(&self) -> Vec<String> {
        self.properties
            .iter()
            .flat_map(|p| {
                p.count_key
                    .iter()
                    .chain(p.selection_key.iter())
                    .chain(p.visible_when.iter().map(|c| &c.key))
                    .filter(|k| self.property(k).is_none())
                    .map(move |k| format!("{} -> {}", p.key, k))
            })
            .collect()
    }
}
