#[path = "../test_utils.rs"]
mod test_utils;

mod availability_test;
mod bookings_test;
mod middleware_test;
mod slots_test;
