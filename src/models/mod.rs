pub mod tags;
pub mod tracks;
pub mod user;
