pub mod constants;
pub mod json;
pub mod secrets;
