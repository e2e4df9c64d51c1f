pub mod engine;
pub mod sensitivity;
