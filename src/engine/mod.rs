pub mod definition;
pub mod error;
pub mod events;
pub mod executor;
pub mod recovery;
pub mod types;
