pub mod photo;
pub mod profile;
