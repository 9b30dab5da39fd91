pub mod event;
pub mod intent;
pub mod meeting;
pub mod slot;
pub mod window;

pub use event::{CalendarEvent, EventTime};
pub use intent::{ExtractedMeeting, MeetingIntent, Minutes};
pub use meeting::{CreateEventRequest, MeetingRecord};
pub use slot::CandidateSlot;
pub use window::{BusyInterval, InvalidWindow, TimeWindow};
