use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;

use crate::config::Config;
use crate::fetch::ImageFetcher;
use crate::ocr::{OcrFactory, OcrInterface};
use crate::render::{OverlayRenderer, RenderInterface};
use crate::translate::{MyMemoryTranslator, TranslateInterface};

/// Shared, read-only per-process state. Requests never mutate it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: ImageFetcher,
    pub ocr: Arc<dyn OcrInterface>,
    pub translator: Arc<dyn TranslateInterface>,
    pub renderer: Arc<dyn RenderInterface>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let fetcher = ImageFetcher::new(&config.fetch)?;
        let client = Client::builder()
            .user_agent(&config.fetch.user_agent)
            .build()?;

        let ocr = OcrFactory::create_ocr(&config.ocr, client.clone());
        let translator = Arc::new(MyMemoryTranslator::new(client, &config.translate));
        let renderer = Arc::new(OverlayRenderer::from_config(&config.render)?);

        Ok(Self::with_components(config, fetcher, ocr, translator, renderer))
    }

    /// Assemble state from explicit collaborators
    pub fn with_components(
        config: Config,
        fetcher: ImageFetcher,
        ocr: Arc<dyn OcrInterface>,
        translator: Arc<dyn TranslateInterface>,
        renderer: Arc<dyn RenderInterface>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            ocr,
            translator,
            renderer,
            started_at: Utc::now(),
        }
    }
}
