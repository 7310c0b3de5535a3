pub mod payload;
pub mod submit;
