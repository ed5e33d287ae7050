//! Voice skill request handling

pub mod envelope;
pub mod handler;

pub use envelope::{RequestEnvelope, ResponseEnvelope, SkillRequest};
pub use handler::SkillHandler;
