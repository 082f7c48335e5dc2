// Core modules implementing variant identity, registration, and the container protocol.
pub mod error;
pub mod poly;
pub mod registry;
pub mod variant;
