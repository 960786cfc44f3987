pub mod fulfill;
pub mod request;
