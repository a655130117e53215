pub mod fill;
pub mod profile;
pub mod resume;
