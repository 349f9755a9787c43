pub mod font;
pub mod fragment;
pub mod glyph;
pub mod label;
pub mod overlay;

pub use fragment::TicketFragment;
pub use overlay::{OverlayPlan, build_overlay};
