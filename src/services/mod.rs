pub mod aggregator;
pub mod ai;
pub mod calendar;
pub mod dates;
pub mod scheduling;
pub mod slots;
