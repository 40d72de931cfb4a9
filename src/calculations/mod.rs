pub mod materializer;
pub mod resolver;

pub use materializer::Materializer;
pub use resolver::{Resolution, TimeGroupResolver, TimeGroupVisit, UnresolvedReason};
