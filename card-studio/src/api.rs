//! Client for the community design persistence API.
//!
//! Three endpoints are consumed: design creation, design update and the
//! best-effort design-to-tab mapping made after a successful create.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{StudioError, StudioResult};

/// Design creation endpoint.
pub const CREATE_DESIGN_PATH: &str = "/api/master/community-designs/create";

/// Design update endpoint.
pub const UPDATE_DESIGN_PATH: &str = "/api/master/community-designs/updateCommunityDesignById";

/// Design-to-tab mapping endpoint.
pub const CREATE_TAB_MAP_PATH: &str = "/api/master/design-tabs-map/create";

/// Body of a create or update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignPayload {
    /// Category id.
    pub categories_id: i64,
    /// Cover image as a data URI, or the stored image on update.
    pub image: String,
    /// Title.
    pub title: String,
    /// Sub-title.
    pub sub_title: String,
    /// Skill level label.
    pub image_type: String,
    /// Pricing label.
    pub image_sell_type: String,
    /// Hashtags.
    pub hash_tag: Vec<String>,
    /// Serialized scene document.
    pub design_json_data: String,
    /// Whether the design is active.
    pub status: bool,
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    id: i64,
    #[serde(flatten)]
    payload: &'a DesignPayload,
}

/// Body of the tab mapping call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabMapPayload {
    /// Tab id.
    pub tabs_id: i64,
    /// Design being mapped.
    pub community_designs_id: i64,
    /// Whether the mapping is active.
    pub status: bool,
}

/// Envelope every endpoint answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Payload, absent on some successful answers.
    pub data: Option<T>,
    /// Server message.
    #[serde(default)]
    pub message: Option<String>,
}

/// The part of a created design the editor needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedDesign {
    /// Id of the new design.
    #[serde(default)]
    pub community_designs_id: i64,
}

/// A stored community design, as the editor opens it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityDesign {
    /// Design id.
    #[serde(default)]
    pub community_designs_id: Option<i64>,
    /// Category id, or an expanded category object.
    #[serde(default)]
    pub categories_id: Value,
    /// Stored cover image.
    #[serde(default)]
    pub image: String,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Sub-title.
    #[serde(default)]
    pub sub_title: Option<String>,
    /// Skill level label.
    #[serde(default)]
    pub image_type: Option<String>,
    /// Pricing label.
    #[serde(default)]
    pub image_sell_type: Option<String>,
    /// Hashtags.
    #[serde(default)]
    pub hash_tag: Option<Vec<String>>,
    /// Whether the design is active.
    #[serde(default)]
    pub status: Option<bool>,
    /// Serialized scene document.
    #[serde(default)]
    pub design_json_data: Option<String>,
}

impl CommunityDesign {
    /// Numeric category id, when the API sent a plain number.
    #[must_use]
    pub fn category_id(&self) -> Option<i64> {
        self.categories_id.as_i64()
    }
}

/// Split a comma-separated tag string, trimming and dropping empties.
#[must_use]
pub fn parse_hash_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// The persistence operations the pipeline needs.
#[async_trait]
pub trait DesignApi: Send + Sync {
    /// Create a new community design.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    async fn create_design(&self, payload: &DesignPayload) -> StudioResult<CreatedDesign>;

    /// Replace an existing community design.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    async fn update_design(&self, id: i64, payload: &DesignPayload) -> StudioResult<()>;

    /// Map a design to a tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    async fn create_design_tab_map(&self, payload: &TabMapPayload) -> StudioResult<()>;
}

/// [`DesignApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDesignApi {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl HttpDesignApi {
    /// Create a client for `base_url`.
    ///
    /// Endpoints resolve beneath the base URL's path, so
    /// `https://host/v2` and `https://host/v2/` both send to
    /// `https://host/v2/api/...`.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::InvalidUrl`] if the URL is malformed.
    /// Returns [`StudioError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: impl AsRef<str>, token: Option<String>) -> StudioResult<Self> {
        let mut base =
            Url::parse(base_url.as_ref()).map_err(|e| StudioError::InvalidUrl(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .user_agent(concat!("vibescard-studio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base, token })
    }

    fn endpoint(&self, path: &str) -> StudioResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| StudioError::InvalidUrl(e.to_string()))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> StudioResult<T> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StudioError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DesignApi for HttpDesignApi {
    async fn create_design(&self, payload: &DesignPayload) -> StudioResult<CreatedDesign> {
        let url = self.endpoint(CREATE_DESIGN_PATH)?;
        tracing::debug!("POST {}", url);
        let response: ApiResponse<CreatedDesign> =
            self.send(self.http.post(url).json(payload)).await?;
        Ok(response.data.unwrap_or_default())
    }

    async fn update_design(&self, id: i64, payload: &DesignPayload) -> StudioResult<()> {
        let url = self.endpoint(UPDATE_DESIGN_PATH)?;
        tracing::debug!("PUT {} (design {})", url, id);
        let _: ApiResponse<Value> = self
            .send(self.http.put(url).json(&UpdateBody { id, payload }))
            .await?;
        Ok(())
    }

    async fn create_design_tab_map(&self, payload: &TabMapPayload) -> StudioResult<()> {
        let url = self.endpoint(CREATE_TAB_MAP_PATH)?;
        tracing::debug!("POST {}", url);
        let _: ApiResponse<Value> = self.send(self.http.post(url).json(payload)).await?;
        Ok(())
    }
}
