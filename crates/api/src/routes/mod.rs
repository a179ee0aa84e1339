pub mod availability;
pub mod bookings;
pub mod health;
pub mod reminders;
pub mod slots;
