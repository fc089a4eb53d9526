pub mod client;
pub mod session;

pub use client::{ApiError, CalendarApi, HttpCalendarClient};
pub use session::{Session, SessionError, SessionStorage};
