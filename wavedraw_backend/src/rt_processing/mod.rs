pub mod callback;
pub mod engine;
