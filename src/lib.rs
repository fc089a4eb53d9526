pub mod api;
pub mod calendar;
pub mod router;
pub mod storage;
pub mod store;

pub use api::{CalendarApi, HttpCalendarClient, Session};
pub use calendar::{Calendar, Section};
pub use router::{Navigation, Router, View};
pub use store::{CalendarState, CalendarStore, StoreError};
