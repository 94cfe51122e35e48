pub mod reservation;
pub mod session;

pub use reservation::{MeetingType, Reservation, ReservationStatus};
pub use session::Session;
