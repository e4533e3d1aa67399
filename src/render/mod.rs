pub mod interface;
pub mod overlay;

pub use interface::{RenderInterface, RenderedImage};
pub use overlay::OverlayRenderer;
