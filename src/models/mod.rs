pub mod appointment;
pub mod conversation;
pub mod doctor;
pub mod enums;
pub mod schedule;
pub mod user;

pub use appointment::Appointment;
pub use conversation::{Conversation, Message};
pub use doctor::{Doctor, DoctorListing};
pub use schedule::{ScheduleDay, TimeSlot};
pub use user::{PublicUser, User};
