use crate::calendar::{Calendar, Section};

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Calendar state. Mutations are plain synchronous writers; validation
/// and persistence belong to the actions in [`super::CalendarStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarState {
    pub local_calendars: Vec<Calendar>,
    pub api_calendars: Vec<Calendar>,
    pub calendar: Option<Calendar>,
    pub notifications: Vec<Notification>,
}

impl CalendarState {
    pub fn set_local_calendars(&mut self, calendars: Vec<Calendar>) {
        self.local_calendars = calendars;
    }

    pub fn set_api_calendars(&mut self, calendars: Vec<Calendar>) {
        self.api_calendars = calendars;
    }

    pub fn set_calendar(&mut self, calendar: Option<Calendar>) {
        self.calendar = calendar;
    }

    pub fn add_local_calendar(&mut self, calendar: Calendar) {
        self.local_calendars.push(calendar);
    }

    pub fn remove_local_calendar(&mut self, uuid: Option<&str>) {
        self.local_calendars.retain(|c| c.uuid.as_deref() != uuid);
    }

    pub fn update_local_calendar(&mut self, calendar: Calendar) {
        if let Some(slot) = self
            .local_calendars
            .iter_mut()
            .find(|c| c.uuid.is_some() && c.uuid == calendar.uuid)
        {
            *slot = calendar;
        }
    }

    pub fn update_api_calendar(&mut self, calendar: Calendar) {
        if let Some(slot) = self
            .api_calendars
            .iter_mut()
            .find(|c| c.uuid.is_some() && c.uuid == calendar.uuid)
        {
            *slot = calendar;
        }
    }

    pub fn add_section(&mut self, section: Section) {
        if let Some(calendar) = self.calendar.as_mut() {
            calendar.sections.push(section);
        }
    }

    pub fn remove_section(&mut self, code: &str) {
        if let Some(calendar) = self.calendar.as_mut() {
            calendar.sections.retain(|s| s.code != code);
        }
    }

    pub fn push_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn uuid_api_calendars_exist(&self, uuid: &str) -> bool {
        self.api_calendars.iter().any(|c| c.has_uuid(uuid))
    }

    pub fn find_local(&self, uuid: &str) -> Option<&Calendar> {
        self.local_calendars.iter().find(|c| c.has_uuid(uuid))
    }

    pub fn find_api(&self, uuid: &str) -> Option<&Calendar> {
        self.api_calendars.iter().find(|c| c.has_uuid(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn calendar(uuid: &str, name: &str) -> Calendar {
        Calendar::new(name).with_uuid(uuid)
    }

    #[test]
    fn add_local_calendar_appends() {
        let mut state = CalendarState::default();
        state.add_local_calendar(calendar("a", "A"));
        state.add_local_calendar(calendar("b", "B"));

        let uuids: Vec<_> = state.local_calendars.iter().map(|c| c.uuid.clone()).collect();
        assert_eq!(uuids, vec![Some("a".to_string()), Some("b".to_string())]);
    }

    #[test]
    fn remove_local_calendar_filters_by_uuid() {
        let mut state = CalendarState::default();
        state.set_local_calendars(vec![calendar("a", "A"), calendar("b", "B")]);

        state.remove_local_calendar(Some("a"));

        assert_eq!(state.local_calendars, vec![calendar("b", "B")]);
    }

    #[test]
    fn update_local_calendar_replaces_matching_uuid_in_place() {
        let mut state = CalendarState::default();
        state.set_local_calendars(vec![calendar("a", "A"), calendar("b", "B"), calendar("c", "C")]);

        state.update_local_calendar(calendar("b", "Renamed"));

        assert_eq!(state.local_calendars[1].name.as_deref(), Some("Renamed"));
        assert_eq!(state.local_calendars.len(), 3);
    }

    #[test]
    fn update_local_calendar_ignores_unknown_uuid() {
        let mut state = CalendarState::default();
        state.set_local_calendars(vec![calendar("a", "A")]);

        state.update_local_calendar(calendar("zzz", "Other"));

        assert_eq!(state.local_calendars, vec![calendar("a", "A")]);
    }

    #[test]
    fn update_local_calendar_without_uuid_changes_nothing() {
        let mut state = CalendarState::default();
        state.set_local_calendars(vec![Calendar::new("legacy")]);

        state.update_local_calendar(Calendar::new("other"));

        assert_eq!(state.local_calendars[0].name.as_deref(), Some("legacy"));
    }

    #[test]
    fn update_api_calendar_replaces_matching_uuid() {
        let mut state = CalendarState::default();
        state.set_api_calendars(vec![calendar("x", "X").tagged_from_api()]);

        state.update_api_calendar(calendar("x", "New").tagged_from_api());

        assert_eq!(state.api_calendars[0].name.as_deref(), Some("New"));
    }

    #[test]
    fn add_and_remove_section_on_selection() {
        let mut state = CalendarState::default();
        state.set_calendar(Some(calendar("a", "A")));

        state.add_section(Section::new("MATH-1"));
        state.add_section(Section::new("PHYS-2"));
        state.remove_section("MATH-1");

        let codes: Vec<_> = state
            .calendar
            .as_ref()
            .unwrap()
            .sections
            .iter()
            .map(|s| s.code.as_str())
            .collect();
        assert_eq!(codes, vec!["PHYS-2"]);
    }

    #[test]
    fn add_section_without_selection_is_a_no_op() {
        let mut state = CalendarState::default();

        state.add_section(Section::new("MATH-1"));

        assert!(state.calendar.is_none());
    }

    #[test]
    fn uuid_api_calendars_exist_checks_api_list_only() {
        let mut state = CalendarState::default();
        state.set_api_calendars(vec![calendar("remote", "R")]);
        state.set_local_calendars(vec![calendar("local", "L")]);

        assert!(state.uuid_api_calendars_exist("remote"));
        assert!(!state.uuid_api_calendars_exist("local"));
    }
}
