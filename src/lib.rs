pub mod compose;
pub mod config;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod pdf;
pub mod pipeline;
pub mod placement;
pub mod render;
pub mod report;
pub mod ticket_text;
