pub mod booking;
pub mod caller;
pub mod clock;
pub mod slot;

pub use booking::{Booking, BookingFilter, BookingStatus, ClaimReceipt, Visit};
pub use caller::{Caller, Role};
pub use clock::{ClockTime, DateWindow};
pub use slot::{NewSlot, Slot, SlotTimes};
