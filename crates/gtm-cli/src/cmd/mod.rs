pub mod config;
pub mod events;
pub mod replay;
pub mod status;
pub mod submit;
