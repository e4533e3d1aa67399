use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AppResult;

/// An encoded image plus its pixel dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Composites translated text onto a source image
#[async_trait]
pub trait RenderInterface: Send + Sync {
    async fn composite(&self, image: Bytes, text: &str) -> AppResult<RenderedImage>;
}
