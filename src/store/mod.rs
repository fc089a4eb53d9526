pub mod actions;
pub mod state;

pub use actions::{CALENDARS_KEY, CalendarStore, StoreError};
pub use state::{CalendarState, Notification, NotificationLevel};
