pub mod availability;
pub mod bookings;
pub mod reminders;
pub mod slots;
