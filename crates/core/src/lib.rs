pub mod config;
pub mod errors;
pub mod ports;
pub mod profile;

pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use ports::{IdeaGenerator, Summarizer, TopicLookup};
pub use profile::{Email, UserProfile};
