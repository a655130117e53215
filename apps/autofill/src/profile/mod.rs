// Profile Store client and the endpoints that read and save profiles.

pub mod handlers;
pub mod store;
