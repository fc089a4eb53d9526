use crate::calendar::{Calendar, SectionId};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Calendar not found: {0}")]
    NotFound(String),
    #[error("Authentication failed")]
    AuthenticationFailed,
}

#[derive(Debug, Serialize)]
struct SectionsPayload<'a> {
    sections: &'a [SectionId],
}

#[derive(Debug, Serialize)]
struct PrivacyPayload {
    is_public: bool,
}

/// Remote calendar resource. `token` is sent as a bearer token when present.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn list_calendars(&self, token: Option<&str>) -> Result<Vec<Calendar>, ApiError>;

    async fn create_calendar(
        &self,
        token: Option<&str>,
        calendar: &Calendar,
    ) -> Result<Calendar, ApiError>;

    async fn get_calendar(&self, token: Option<&str>, uuid: &str) -> Result<Calendar, ApiError>;

    async fn update_calendar(
        &self,
        token: Option<&str>,
        uuid: &str,
        calendar: &Calendar,
    ) -> Result<Calendar, ApiError>;

    async fn sync_sections(
        &self,
        token: Option<&str>,
        uuid: &str,
        section_ids: &[SectionId],
    ) -> Result<(), ApiError>;

    async fn set_privacy(
        &self,
        token: Option<&str>,
        uuid: &str,
        is_public: bool,
    ) -> Result<Calendar, ApiError>;

    async fn delete_calendar(&self, token: Option<&str>, uuid: &str) -> Result<(), ApiError>;
}

pub struct HttpCalendarClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCalendarClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/calendars", self.base_url)
    }

    fn calendar_url(&self, uuid: &str) -> String {
        format!("{}/calendars/{}", self.base_url, urlencoding::encode(uuid))
    }

    fn authorized(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check_status(response: Response, subject: &str) -> Result<Response, ApiError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::error!("Authentication failed for {}", subject);
            return Err(ApiError::AuthenticationFailed);
        }

        if status == StatusCode::NOT_FOUND {
            tracing::error!("Calendar not found: {}", subject);
            return Err(ApiError::NotFound(subject.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Request for {} failed. Status: {}, Body: {}", subject, status, body);
            return Err(ApiError::RequestError(format!("Status {}: {}", status, body)));
        }

        Ok(response)
    }
}

#[async_trait]
impl CalendarApi for HttpCalendarClient {
    async fn list_calendars(&self, token: Option<&str>) -> Result<Vec<Calendar>, ApiError> {
        let url = self.collection_url();
        tracing::info!("GET {}", url);

        let response = Self::authorized(self.client.get(&url), token).send().await?;
        let response = Self::check_status(response, "calendars").await?;
        let calendars: Vec<Calendar> = response.json().await?;

        tracing::info!("Fetched {} calendars", calendars.len());
        Ok(calendars)
    }

    async fn create_calendar(
        &self,
        token: Option<&str>,
        calendar: &Calendar,
    ) -> Result<Calendar, ApiError> {
        let url = self.collection_url();
        tracing::info!("Creating calendar {}", calendar.display_name());
        tracing::debug!("POST {} with payload: {:?}", url, calendar);

        let response = Self::authorized(self.client.post(&url), token)
            .json(calendar)
            .send()
            .await?;
        let response = Self::check_status(response, "calendars").await?;
        let created: Calendar = response.json().await?;

        tracing::info!("Calendar created with uuid {:?}", created.uuid);
        Ok(created)
    }

    async fn get_calendar(&self, token: Option<&str>, uuid: &str) -> Result<Calendar, ApiError> {
        let url = self.calendar_url(uuid);
        tracing::info!("GET {}", url);

        let response = Self::authorized(self.client.get(&url), token).send().await?;
        let response = Self::check_status(response, uuid).await?;
        Ok(response.json().await?)
    }

    async fn update_calendar(
        &self,
        token: Option<&str>,
        uuid: &str,
        calendar: &Calendar,
    ) -> Result<Calendar, ApiError> {
        let url = self.calendar_url(uuid);
        tracing::info!("Updating calendar {}", uuid);
        tracing::debug!("PUT {} with payload: {:?}", url, calendar);

        let response = Self::authorized(self.client.put(&url), token)
            .json(calendar)
            .send()
            .await?;
        let response = Self::check_status(response, uuid).await?;
        Ok(response.json().await?)
    }

    async fn sync_sections(
        &self,
        token: Option<&str>,
        uuid: &str,
        section_ids: &[SectionId],
    ) -> Result<(), ApiError> {
        let url = format!("{}/sections", self.calendar_url(uuid));
        tracing::debug!("POST {} with {} sections", url, section_ids.len());

        let response = Self::authorized(self.client.post(&url), token)
            .json(&SectionsPayload {
                sections: section_ids,
            })
            .send()
            .await?;
        Self::check_status(response, uuid).await?;
        Ok(())
    }

    async fn set_privacy(
        &self,
        token: Option<&str>,
        uuid: &str,
        is_public: bool,
    ) -> Result<Calendar, ApiError> {
        let url = self.calendar_url(uuid);
        tracing::info!("Setting calendar {} is_public={}", uuid, is_public);

        let response = Self::authorized(self.client.patch(&url), token)
            .json(&PrivacyPayload { is_public })
            .send()
            .await?;
        let response = Self::check_status(response, uuid).await?;
        Ok(response.json().await?)
    }

    async fn delete_calendar(&self, token: Option<&str>, uuid: &str) -> Result<(), ApiError> {
        let url = self.calendar_url(uuid);
        tracing::info!("DELETE {}", url);

        let response = Self::authorized(self.client.delete(&url), token).send().await?;
        Self::check_status(response, uuid).await?;
        Ok(())
    }
}
