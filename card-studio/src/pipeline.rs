//! Export, publish and update.
//!
//! Export and publish share one preparation sequence: wait for images to
//! settle, embed external images as data URIs (recorded in history), give
//! the renderer a settle delay and rasterize. Update skips all of it and
//! keeps the stored cover image.

use std::path::PathBuf;
use std::sync::Arc;

use card_core::{
    DataField, DesignDocument, DesignExport, EventDetails, Notification, Notifier,
};
use card_renderer::{ImageResolver, Raster, RenderBackend};

use crate::api::{parse_hash_tags, DesignApi, DesignPayload, TabMapPayload};
use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};
use crate::session::EditorSession;

/// Title used when a published design has none.
pub const FALLBACK_TITLE: &str = "Amazing Design";

/// What the publish dialog collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishRequest {
    /// Title; the event title when absent.
    pub title: Option<String>,
    /// Sub-title; the event message when absent.
    pub sub_title: Option<String>,
    /// Comma-separated hashtags.
    pub tags: String,
}

/// Result of a successful publish.
#[derive(Debug)]
pub struct PublishOutcome {
    /// Id the API assigned to the new design.
    pub community_designs_id: i64,
    /// Outcome of the follow-up tab mapping, which never fails the publish.
    pub tab_mapping: StudioResult<()>,
}

/// Drives export, publish and update for an [`EditorSession`].
#[derive(Clone)]
pub struct ExportPipeline {
    config: StudioConfig,
    resolver: ImageResolver,
    api: Arc<dyn DesignApi>,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl ExportPipeline {
    /// Create a pipeline.
    #[must_use]
    pub fn new(config: StudioConfig, resolver: ImageResolver, api: Arc<dyn DesignApi>) -> Self {
        Self {
            config,
            resolver,
            api,
        }
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// Shared preparation: settle, embed, wait, rasterize.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable raster could be produced.
    pub async fn prepare<B: RenderBackend>(
        &self,
        session: &mut EditorSession<B>,
    ) -> StudioResult<Raster> {
        let current = session.store().elements().to_vec();
        let settled = session
            .sync_mut()
            .await_image_settle(&current, &self.resolver)
            .await;
        tracing::debug!("Settled {} images before export", settled);

        let embedded = self.resolver.preload_for_export(&current).await;
        session.store_mut().set_elements_with_history(embedded);

        let updated = session.store().elements().to_vec();
        session
            .sync_mut()
            .await_image_settle(&updated, &self.resolver)
            .await;
        session.render();

        tokio::time::sleep(self.config.settle_delay()).await;

        let raster = session
            .sync_mut()
            .rasterize_for_export(self.config.pixel_ratio)?;
        tracing::info!("Rasterized design ({} bytes)", raster.png().len());
        Ok(raster)
    }

    /// Render the design and write it as `vibescard-<millis>.png` in the
    /// output directory.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation or writing fails; the failure is also
    /// reported through the session's notifier.
    pub async fn export<B: RenderBackend>(
        &self,
        session: &mut EditorSession<B>,
    ) -> StudioResult<PathBuf> {
        let notifier = session.notifier();
        notifier.notify(Notification::info(
            "Preparing Export",
            "Loading images and preparing canvas...",
        ));

        let result = async {
            let raster = self.prepare(session).await?;
            self.write_output(&export_file_name(), raster.png()).await
        }
        .await;

        match result {
            Ok(path) => {
                tracing::info!("Exported design to {}", path.display());
                notifier.notify(Notification::info(
                    "Export Success",
                    "Your invitation has been downloaded",
                ));
                Ok(path)
            }
            Err(e) => {
                tracing::warn!("Export failed: {}", e);
                notifier.notify(Notification::destructive("Export Failed", e.to_string()));
                Err(e)
            }
        }
    }

    /// Write the portable JSON export of the design to the output directory.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn export_json<B: RenderBackend>(
        &self,
        session: &EditorSession<B>,
    ) -> StudioResult<PathBuf> {
        let now = chrono::Utc::now();
        let export = DesignExport::from_store_at(session.store(), session.details(), now);
        let json = export.to_json_pretty()?;
        self.write_output(&DesignExport::file_name(now), json.as_bytes())
            .await
    }

    /// Render the design and publish it as a new community design.
    ///
    /// A tab mapping is attempted after a successful create; its failure is
    /// reported but does not fail the publish.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation or the create call fails.
    pub async fn publish<B: RenderBackend>(
        &self,
        session: &mut EditorSession<B>,
        request: &PublishRequest,
    ) -> StudioResult<PublishOutcome> {
        let notifier = session.notifier();
        notifier.notify(Notification::info(
            "Preparing Design",
            "Loading images and preparing canvas...",
        ));

        let payload = match self.publish_payload(session, request).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Publish preparation failed: {}", e);
                notifier.notify(Notification::destructive("Publish Error", e.to_string()));
                return Err(e);
            }
        };

        let created = match self.api.create_design(&payload).await {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!("Create design failed: {}", e);
                notifier.notify(Notification::destructive(
                    "Publish Failed",
                    "Unable to publish design. Please try again.",
                ));
                return Err(e);
            }
        };
        tracing::info!("Published design {}", created.community_designs_id);
        notifier.notify(Notification::info(
            "Design Published",
            "Your design has been published to the community.",
        ));

        let tab_mapping = self
            .api
            .create_design_tab_map(&TabMapPayload {
                tabs_id: self.config.tabs_id,
                community_designs_id: created.community_designs_id,
                status: true,
            })
            .await;
        if let Err(e) = &tab_mapping {
            tracing::warn!("Failed to map design to tab: {}", e);
            notifier.notify(Notification::destructive(
                "Mapping Failed",
                "Design was published but mapping to tabs failed.",
            ));
        }

        Ok(PublishOutcome {
            community_designs_id: created.community_designs_id,
            tab_mapping,
        })
    }

    async fn publish_payload<B: RenderBackend>(
        &self,
        session: &mut EditorSession<B>,
        request: &PublishRequest,
    ) -> StudioResult<DesignPayload> {
        let raster = self.prepare(session).await?;
        let details = session.details().clone();
        let design_json_data = scene_json(session, &details)?;

        let title = request
            .title
            .clone()
            .unwrap_or_else(|| details.title.clone());
        let sub_title = request
            .sub_title
            .clone()
            .unwrap_or_else(|| details.message.clone());

        Ok(DesignPayload {
            categories_id: self.config.categories_id,
            image: raster.data_uri().to_string(),
            title: non_empty(title).unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            sub_title,
            image_type: self.config.image_type.clone(),
            image_sell_type: self.config.image_sell_type.clone(),
            hash_tag: parse_hash_tags(&request.tags),
            design_json_data,
            status: true,
        })
    }

    /// Save the current scene over the design the session was opened from.
    ///
    /// The stored cover image is sent back unchanged; nothing is
    /// re-rasterized or re-embedded. Non-empty `tags` replace the stored
    /// hashtags.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::NoInitialDesign`] if the session has no design
    /// id, or an error if the update call fails.
    pub async fn update<B: RenderBackend>(
        &self,
        session: &EditorSession<B>,
        tags: &str,
    ) -> StudioResult<()> {
        let notifier = session.notifier();
        let Some((id, design)) = session
            .initial_design()
            .and_then(|d| d.community_designs_id.map(|id| (id, d)))
        else {
            notifier.notify(Notification::destructive(
                "Update Error",
                "No initial design ID to update.",
            ));
            return Err(StudioError::NoInitialDesign);
        };

        let live = session.details();
        let mut document_details = live.clone();
        if !design.title.is_empty() {
            document_details.set(DataField::Title, design.title.clone());
        }
        if let Some(sub_title) = design.sub_title.as_deref().filter(|s| !s.is_empty()) {
            document_details.set(DataField::Message, sub_title);
        }

        let design_json_data = match scene_json(session, &document_details) {
            Ok(json) => json,
            Err(e) => {
                notifier.notify(Notification::destructive("Update Error", e.to_string()));
                return Err(e);
            }
        };

        let hash_tag = if tags.is_empty() {
            design.hash_tag.clone().unwrap_or_default()
        } else {
            parse_hash_tags(tags)
        };

        let payload = DesignPayload {
            categories_id: design.category_id().unwrap_or(self.config.categories_id),
            image: design.image.clone(),
            title: non_empty(live.title.clone())
                .or_else(|| non_empty(design.title.clone()))
                .unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            sub_title: non_empty(live.message.clone())
                .or_else(|| design.sub_title.clone())
                .unwrap_or_default(),
            image_type: design
                .image_type
                .clone()
                .and_then(non_empty)
                .unwrap_or_else(|| self.config.image_type.clone()),
            image_sell_type: design
                .image_sell_type
                .clone()
                .and_then(non_empty)
                .unwrap_or_else(|| self.config.image_sell_type.clone()),
            hash_tag,
            design_json_data,
            status: design.status.unwrap_or(true),
        };

        match self.api.update_design(id, &payload).await {
            Ok(()) => {
                tracing::info!("Updated design {}", id);
                notifier.notify(Notification::info(
                    "Design Updated",
                    "Your design has been updated in the community.",
                ));
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Update design {} failed: {}", id, e);
                notifier.notify(Notification::destructive(
                    "Update Failed",
                    "Unable to update design. Please try again.",
                ));
                Err(e)
            }
        }
    }

    async fn write_output(&self, file_name: &str, bytes: &[u8]) -> StudioResult<PathBuf> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let path = self.config.output_dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

/// Serialize the scene, preferring the renderer's own document and falling
/// back to one assembled from the store.
///
/// # Errors
///
/// Returns an error only if the fallback document cannot be serialized.
pub fn scene_json<B: RenderBackend>(
    session: &EditorSession<B>,
    details: &EventDetails,
) -> StudioResult<String> {
    match session.sync().serialize_scene() {
        Some(Ok(json)) => return Ok(json),
        Some(Err(e)) => {
            tracing::warn!("Scene serialization failed, assembling document: {}", e);
        }
        None => tracing::debug!("Renderer has no serializer, assembling document"),
    }
    Ok(DesignDocument::from_store(session.store(), details).to_json()?)
}

/// `vibescard-<unix-millis>.png`
#[must_use]
pub fn export_file_name() -> String {
    format!("vibescard-{}.png", chrono::Utc::now().timestamp_millis())
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}
