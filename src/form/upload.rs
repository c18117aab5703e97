//! Document and video uploads delegated to external asset collaborators.
//!
//! The form never moves bytes itself. It hands files to an [`AssetApi`] and
//! stores the descriptors that come back, keeping the upload property's
//! hidden selection key pointed at an attached asset.

use super::SettingsForm;
use super::coerce::{read_array, read_string};
use crate::error::{FormError, UpstreamApiError};
use crate::schema::{PropertyDefinition, PropertyType};
use async_trait::async_trait;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Document,
    Video,
}

/// What a collaborator reports about a stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl AssetDescriptor {
    pub fn new(id: &str, name: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    fn from_value(value: &Value, context: &str) -> Option<Self> {
        match value {
            Value::Object(_) => {
                let read = |name: &str| value.get(name).map(|v| read_string(v, context)).unwrap_or_default();
                let id = read("id");
                (!id.is_empty()).then(|| Self {
                    name: read("name"),
                    url: read("url"),
                    id,
                })
            }
            // Older bags stored bare identifiers.
            Value::String(id) if !id.is_empty() => Some(Self::new(id, id, "")),
            other => {
                log::warn!("Coercion fallback for '{}': dropping asset entry {}", context, other);
                None
            }
        }
    }

    /// Reads the descriptors stored in an upload property.
    pub fn read_list(value: &Value, context: &str) -> Vec<Self> {
        read_array(value, context)
            .iter()
            .filter_map(|v| Self::from_value(v, context))
            .collect()
    }

    fn to_list(assets: &[Self]) -> Value {
        serde_json::to_value(assets).unwrap_or_else(|_| Value::Array(Vec::new()))
    }
}

/// A file handed to [`AssetApi::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }
}

/// The document or video service that stores uploaded assets.
///
/// Assets are grouped per container; the form uses its node id.
#[async_trait]
pub trait AssetApi: Send + Sync {
    async fn upload(
        &self,
        container_id: &str,
        files: Vec<UploadFile>,
    ) -> Result<Vec<AssetDescriptor>, UpstreamApiError>;

    async fn list(&self, container_id: &str) -> Result<Vec<AssetDescriptor>, UpstreamApiError>;

    async fn remove(&self, asset_id: &str) -> Result<(), UpstreamApiError>;
}

impl<'r> SettingsForm<'r> {
    fn upload_property(&self, key: &str, operation: &'static str) -> Result<&'r PropertyDefinition, FormError> {
        let property = self.property(key)?;
        match property.property_type {
            PropertyType::FileUpload | PropertyType::VideoUpload => Ok(property),
            property_type => Err(FormError::UnsupportedOperation {
                key: key.to_string(),
                property_type,
                operation,
            }),
        }
    }

    /// Attached assets of an upload property.
    pub fn assets(&self, key: &str) -> Result<Vec<AssetDescriptor>, FormError> {
        let property = self.upload_property(key, "assets")?;
        Ok(AssetDescriptor::read_list(&self.current_value(property), key))
    }

    /// The selected asset of an upload property, if any.
    pub fn selected_asset(&self, key: &str) -> Result<Option<String>, FormError> {
        let property = self.upload_property(key, "selected_asset")?;
        Ok(property
            .selection_key
            .as_deref()
            .and_then(|k| self.draft.get(k))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    fn store_assets(&mut self, property: &PropertyDefinition, assets: &[AssetDescriptor], selection: Option<&str>) {
        self.draft.insert(property.key.clone(), AssetDescriptor::to_list(assets));
        if let Some(selection_key) = &property.selection_key {
            let selected = selection.unwrap_or_default();
            self.draft.insert(selection_key.clone(), Value::String(selected.to_string()));
        }
    }

    /// Selection after the asset list changed: keep it while still attached,
    /// otherwise fall back to the first asset.
    fn reconcile_selection<'a>(&self, property: &PropertyDefinition, assets: &'a [AssetDescriptor]) -> Option<&'a str> {
        let current = self.selected_asset(&property.key).ok().flatten();
        current
            .and_then(|id| assets.iter().find(|a| a.id == id))
            .or_else(|| assets.first())
            .map(|a| a.id.as_str())
    }

    fn record_upstream_failure(&mut self, error: UpstreamApiError) -> FormError {
        log::warn!("Asset request for node '{}' failed: {}", self.node_id, error);
        self.inline_error = Some(error.to_string());
        FormError::Upstream(error)
    }

    /// Uploads `files` and attaches the returned assets.
    ///
    /// A failed upload leaves the draft untouched and shows a dismissible
    /// inline error.
    pub async fn upload_assets(
        &mut self,
        key: &str,
        api: &dyn AssetApi,
        files: Vec<UploadFile>,
    ) -> Result<Vec<AssetDescriptor>, FormError> {
        self.ensure_editing()?;
        let property = self.upload_property(key, "upload_assets")?;
        let uploaded = match api.upload(&self.node_id, files).await {
            Ok(uploaded) => uploaded,
            Err(error) => return Err(self.record_upstream_failure(error)),
        };

        let assets: Vec<AssetDescriptor> = self
            .assets(key)?
            .into_iter()
            .chain(uploaded.iter().cloned())
            .unique_by(|a| a.id.clone())
            .collect();
        let selection = self.reconcile_selection(property, &assets).map(str::to_string);
        self.store_assets(property, &assets, selection.as_deref());
        log::debug!("Attached {} asset(s) to '{}'", uploaded.len(), key);
        Ok(uploaded)
    }

    /// Replaces the attached assets with what the collaborator currently lists.
    pub async fn refresh_assets(&mut self, key: &str, api: &dyn AssetApi) -> Result<(), FormError> {
        self.ensure_editing()?;
        let property = self.upload_property(key, "refresh_assets")?;
        let assets = match api.list(&self.node_id).await {
            Ok(assets) => assets,
            Err(error) => return Err(self.record_upstream_failure(error)),
        };
        let selection = self.reconcile_selection(property, &assets).map(str::to_string);
        self.store_assets(property, &assets, selection.as_deref());
        Ok(())
    }

    /// Deletes an attached asset upstream, then detaches it.
    pub async fn remove_asset(&mut self, key: &str, api: &dyn AssetApi, asset_id: &str) -> Result<(), FormError> {
        self.ensure_editing()?;
        let property = self.upload_property(key, "remove_asset")?;
        let mut assets = self.assets(key)?;
        let Some(position) = assets.iter().position(|a| a.id == asset_id) else {
            return Err(FormError::UnknownAsset {
                key: key.to_string(),
                asset_id: asset_id.to_string(),
            });
        };
        if let Err(error) = api.remove(asset_id).await {
            return Err(self.record_upstream_failure(error));
        }
        assets.remove(position);
        let selection = self.reconcile_selection(property, &assets).map(str::to_string);
        self.store_assets(property, &assets, selection.as_deref());
        Ok(())
    }

    /// Points the selection key of an upload property at an attached asset.
    pub fn select_asset(&mut self, key: &str, asset_id: &str) -> Result<(), FormError> {
        self.ensure_editing()?;
        let property = self.upload_property(key, "select_asset")?;
        let assets = self.assets(key)?;
        if !assets.iter().any(|a| a.id == asset_id) {
            return Err(FormError::UnknownAsset {
                key: key.to_string(),
                asset_id: asset_id.to_string(),
            });
        }
        self.store_assets(property, &assets, Some(asset_id));
        Ok(())
    }
}
