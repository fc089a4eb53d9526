pub mod calendar_type;
pub mod section;

pub use calendar_type::Calendar;
pub use section::{Section, SectionId};
