use thiserror::Error;
use uuid::Uuid;

use super::state::{CalendarState, Notification, NotificationLevel};
use crate::api::{ApiError, CalendarApi, Session};
use crate::calendar::Calendar;
use crate::storage::{LocalStorage, StorageError};

/// Local storage key holding the JSON array of local calendars.
pub const CALENDARS_KEY: &str = "calendars";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Calendar not found")]
    CalendarNotFound,
    #[error("Authentication required")]
    NotAuthenticated,
    #[error("Calendar has no uuid")]
    MissingUuid,
}

fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Owns the calendar state and mediates between it, local storage and the
/// remote API. Every persistence or network effect goes through an action
/// here; views read [`CalendarState`] and may call its mutations directly.
pub struct CalendarStore<A, S> {
    state: CalendarState,
    session: Session,
    api: A,
    storage: S,
}

impl<A: CalendarApi, S: LocalStorage> CalendarStore<A, S> {
    pub fn new(api: A, storage: S, session: Session) -> Self {
        Self {
            state: CalendarState::default(),
            session,
            api,
            storage,
        }
    }

    pub fn state(&self) -> &CalendarState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CalendarState {
        &mut self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = session;
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.state.notifications)
    }

    pub fn uuid_api_calendars_exist(&self, uuid: &str) -> bool {
        self.state.uuid_api_calendars_exist(uuid)
    }

    pub fn get_local_calendars(&mut self) -> Result<(), StoreError> {
        let calendars = match self.storage.get_item(CALENDARS_KEY)? {
            Some(raw) => serde_json::from_str::<Option<Vec<Calendar>>>(&raw)
                .map_err(StorageError::from)?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        tracing::debug!("Loaded {} local calendars", calendars.len());
        self.state.set_local_calendars(calendars);
        Ok(())
    }

    pub fn save_local_calendars(&mut self) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(&self.state.local_calendars).map_err(StorageError::from)?;
        self.storage.set_item(CALENDARS_KEY, &json)?;
        Ok(())
    }

    pub fn set_local_calendars(&mut self, calendars: Vec<Calendar>) -> Result<(), StoreError> {
        self.state.set_local_calendars(calendars);
        self.save_local_calendars()
    }

    /// Assigns a uuid to every local calendar that lacks one. Does not
    /// persist. Returns how many calendars were given a uuid.
    pub fn add_uuid_to_calendars(&mut self) -> usize {
        let mut assigned = 0;
        let calendars = self
            .state
            .local_calendars
            .iter()
            .cloned()
            .map(|mut calendar| {
                if calendar.uuid.is_none() {
                    calendar.uuid = Some(new_uuid());
                    assigned += 1;
                }
                calendar
            })
            .collect();
        self.state.set_local_calendars(calendars);

        if assigned > 0 {
            tracing::info!("Assigned uuids to {} legacy calendars", assigned);
        }
        assigned
    }

    pub fn add_calendar(&mut self, mut calendar: Calendar) -> Result<Calendar, StoreError> {
        calendar.uuid = Some(new_uuid());
        self.state.add_local_calendar(calendar.clone());
        self.save_local_calendars()?;
        tracing::info!("Created local calendar {:?}", calendar.uuid);
        Ok(calendar)
    }

    /// Materializes a calendar obtained from someone else as a private
    /// local copy.
    pub fn save_shared_calendar(&mut self, shared: Calendar) -> Result<Calendar, StoreError> {
        let calendar = shared.into_local_copy(new_uuid());
        self.state.add_local_calendar(calendar.clone());
        self.save_local_calendars()?;
        tracing::info!("Saved shared calendar locally as {:?}", calendar.uuid);
        Ok(calendar)
    }

    /// `None` means the calendars could not be fetched, not that there are none.
    pub async fn get_api_calendars(&mut self) -> Option<Vec<Calendar>> {
        match self.api.list_calendars(self.session.token()).await {
            Ok(calendars) => {
                let calendars: Vec<Calendar> =
                    calendars.into_iter().map(Calendar::tagged_from_api).collect();
                self.state.set_api_calendars(calendars.clone());
                Some(calendars)
            }
            Err(e) => {
                tracing::error!("Failed to fetch API calendars: {}", e);
                None
            }
        }
    }

    /// Local removal is persisted before the remote delete is attempted and
    /// stands whatever the server answers.
    pub async fn delete_calendar(&mut self, calendar: &Calendar) -> Result<(), StoreError> {
        self.state.remove_local_calendar(calendar.uuid.as_deref());
        self.save_local_calendars()?;

        let (Some(uuid), Some(token)) = (calendar.uuid.as_deref(), self.session.token()) else {
            tracing::debug!("Skipping remote delete for {:?}", calendar.uuid);
            return Ok(());
        };

        match self.api.delete_calendar(Some(token), uuid).await {
            Ok(()) => {
                self.state.api_calendars.retain(|c| !c.has_uuid(uuid));
                tracing::info!("Deleted calendar {} remotely", uuid);
            }
            Err(e) => {
                tracing::warn!("Remote delete of {} failed: {}", uuid, e);
            }
        }
        Ok(())
    }

    /// Without a session the calendar is created locally. With one it is
    /// created on the server only; callers refresh the API list themselves.
    pub async fn create_calendar(&mut self, calendar: Calendar) -> Result<Calendar, StoreError> {
        if !self.session.is_authenticated() {
            return self.add_calendar(calendar);
        }

        let created = self
            .api
            .create_calendar(self.session.token(), &calendar)
            .await?;
        Ok(created.tagged_from_api())
    }

    pub async fn update_calendar(&mut self, calendar: Calendar) -> Result<Calendar, StoreError> {
        if !calendar.is_from_api() {
            self.state.update_local_calendar(calendar.clone());
            self.save_local_calendars()?;
            return Ok(calendar);
        }

        let uuid = calendar.uuid.clone().ok_or(StoreError::MissingUuid)?;
        let token = self.session.token();

        let updated = self
            .api
            .update_calendar(token, &uuid, &calendar)
            .await?
            .tagged_from_api();
        self.state.update_api_calendar(updated.clone());

        // Only the PUT response counts; the sections sync is best-effort.
        if let Err(e) = self
            .api
            .sync_sections(token, &uuid, &calendar.section_ids())
            .await
        {
            tracing::warn!("Section sync for {} failed: {}", uuid, e);
        }

        Ok(updated)
    }

    /// The server's answer replaces both the list entry and the selection.
    pub async fn toggle_privacy(&mut self, uuid: &str) -> Result<Calendar, StoreError> {
        let is_public = !self
            .state
            .find_api(uuid)
            .ok_or(StoreError::CalendarNotFound)?
            .is_public();

        let updated = self
            .api
            .set_privacy(self.session.token(), uuid, is_public)
            .await?
            .tagged_from_api();

        self.state.update_api_calendar(updated.clone());
        self.state.set_calendar(Some(updated.clone()));
        Ok(updated)
    }

    pub fn get_local_calendar_by_uuid(&mut self, uuid: &str) -> Option<Calendar> {
        let calendar = self.state.find_local(uuid).cloned();
        self.state.set_calendar(calendar.clone());
        calendar
    }

    pub async fn get_api_calendar_by_uuid(&mut self, uuid: &str) -> Option<Calendar> {
        match self.api.get_calendar(self.session.token(), uuid).await {
            Ok(calendar) => {
                let calendar = calendar.tagged_from_api();
                self.state.set_calendar(Some(calendar.clone()));
                Some(calendar)
            }
            Err(e) => {
                tracing::error!("Failed to fetch calendar {}: {}", uuid, e);
                None
            }
        }
    }

    pub async fn save_shared_calendar_to_api(
        &mut self,
        calendar: &Calendar,
    ) -> Result<Calendar, StoreError> {
        let Some(token) = self.session.token() else {
            return Err(StoreError::NotAuthenticated);
        };

        let created = match self.api.create_calendar(Some(token), calendar).await {
            Ok(created) => created.tagged_from_api(),
            Err(e) => {
                tracing::error!("Failed to save shared calendar to API: {}", e);
                return Err(e.into());
            }
        };

        self.state.api_calendars.push(created.clone());
        Ok(created)
    }

    /// Fetches a shared calendar, keeps a local duplicate and tries to push
    /// the duplicate to the user's account. Only the local save is required.
    pub async fn save_and_duplicate_shared_calendar(
        &mut self,
        uuid: &str,
    ) -> Result<Calendar, StoreError> {
        let Some(shared) = self.get_api_calendar_by_uuid(uuid).await else {
            self.state
                .push_notification(Notification::error("The shared calendar could not be found"));
            return Err(StoreError::CalendarNotFound);
        };

        let copy = match self.save_shared_calendar(shared) {
            Ok(copy) => copy,
            Err(e) => {
                self.state
                    .push_notification(Notification::error("The calendar could not be saved"));
                return Err(e);
            }
        };

        if let Err(e) = self.save_shared_calendar_to_api(&copy).await {
            tracing::warn!("Duplicate {:?} kept locally only: {}", copy.uuid, e);
            self.state.push_notification(Notification {
                level: NotificationLevel::Warning,
                message: "The calendar was not saved to your account".to_string(),
            });
        }

        self.state.push_notification(Notification::success(format!(
            "\"{}\" was added to your calendars",
            copy.display_name()
        )));
        Ok(copy)
    }
}
