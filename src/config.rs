use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_route")]
    pub route: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_route() -> String {
    "/api/translate-image".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            route: default_route(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrEngine {
    Tesseract,
    OcrSpace,
}

impl std::fmt::Display for OcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrEngine::Tesseract => write!(f, "tesseract"),
            OcrEngine::OcrSpace => write!(f, "ocr_space"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_engine")]
    pub engine: OcrEngine,
    /// Tesseract language spec, `+` separated
    #[serde(default = "default_ocr_languages")]
    pub languages: String,
    /// 6 = assume a single uniform block of text
    #[serde(default = "default_page_seg_mode")]
    pub page_seg_mode: i32,
    #[serde(default)]
    pub dpi: Option<i32>,
    #[serde(default)]
    pub ocr_space: OcrSpaceConfig,
}

fn default_ocr_engine() -> OcrEngine {
    OcrEngine::Tesseract
}

fn default_ocr_languages() -> String {
    "eng+tha+jpn".to_string()
}

fn default_page_seg_mode() -> i32 {
    6
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: default_ocr_engine(),
            languages: default_ocr_languages(),
            page_seg_mode: default_page_seg_mode(),
            dpi: None,
            ocr_space: OcrSpaceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSpaceConfig {
    #[serde(default = "default_ocr_space_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ocr_space_api_key")]
    pub api_key: String,
    #[serde(default = "default_ocr_space_language")]
    pub language: String,
    #[serde(default = "default_ocr_space_engine")]
    pub engine: u8,
}

fn default_ocr_space_endpoint() -> String {
    "https://api.ocr.space/parse/image".to_string()
}

fn default_ocr_space_api_key() -> String {
    "helloworld".to_string()
}

fn default_ocr_space_language() -> String {
    "eng".to_string()
}

fn default_ocr_space_engine() -> u8 {
    2
}

impl Default for OcrSpaceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ocr_space_endpoint(),
            api_key: default_ocr_space_api_key(),
            language: default_ocr_space_language(),
            engine: default_ocr_space_engine(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    #[serde(default = "default_translate_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    #[serde(default = "default_target_lang")]
    pub default_target_lang: String,
    /// Sent as MyMemory's `de` parameter, which raises the daily quota
    #[serde(default)]
    pub contact_email: Option<String>,
}

fn default_translate_endpoint() -> String {
    "https://api.mymemory.translated.net/get".to_string()
}

fn default_source_lang() -> String {
    "auto".to_string()
}

fn default_target_lang() -> String {
    "th".to_string()
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translate_endpoint(),
            source_lang: default_source_lang(),
            default_target_lang: default_target_lang(),
            contact_email: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_font_path")]
    pub font_path: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_margin")]
    pub margin: u32,
    #[serde(default = "default_box_height")]
    pub box_height: u32,
    #[serde(default = "default_corner_radius")]
    pub corner_radius: u32,
    #[serde(default = "default_text_baseline")]
    pub text_baseline: u32,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_font_path() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf".to_string()
}

fn default_font_size() -> f32 {
    24.0
}

fn default_margin() -> u32 {
    50
}

fn default_box_height() -> u32 {
    60
}

fn default_corner_radius() -> u32 {
    10
}

fn default_text_baseline() -> u32 {
    85
}

fn default_stroke_width() -> u32 {
    2
}

fn default_jpeg_quality() -> u8 {
    80
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: default_font_path(),
            font_size: default_font_size(),
            margin: default_margin(),
            box_height: default_box_height(),
            corner_radius: default_corner_radius(),
            text_baseline: default_text_baseline(),
            stroke_width: default_stroke_width(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Paths the router claims for itself.
pub const RESERVED_ROUTES: [&str; 4] = ["/", "/health", "/api/health", "/ping"];

/// Upper bound for any overlay length in pixels
pub const MAX_OVERLAY_EXTENT: u32 = 16_384;

impl Config {
    /// Load configuration from a YAML or JSON file, substituting `${VAR}`
    /// placeholders from the environment first.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path))?;
        let content = substitute_env_vars(&decode_text(&bytes));

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// `HOST` and `PORT` from the environment win over the file.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", port))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }
        if !self.server.route.starts_with('/') {
            anyhow::bail!("server.route must start with '/'");
        }
        if RESERVED_ROUTES.contains(&self.server.route.as_str()) {
            anyhow::bail!("server.route {} is already served", self.server.route);
        }
        if self.ocr.languages.trim().is_empty() {
            anyhow::bail!("ocr.languages must not be empty");
        }
        let render = &self.render;
        if !(1..=100).contains(&render.jpeg_quality) {
            anyhow::bail!("render.jpeg_quality must be between 1 and 100");
        }
        if render.box_height == 0 || render.font_size <= 0.0 {
            anyhow::bail!("render.box_height and render.font_size must be positive");
        }
        let geometry = [
            ("render.margin", render.margin),
            ("render.box_height", render.box_height),
            ("render.corner_radius", render.corner_radius),
            ("render.text_baseline", render.text_baseline),
            ("render.stroke_width", render.stroke_width),
        ];
        for (name, value) in geometry {
            if value > MAX_OVERLAY_EXTENT {
                anyhow::bail!("{} must be at most {}", name, MAX_OVERLAY_EXTENT);
            }
        }
        if render.corner_radius * 2 > render.box_height {
            anyhow::bail!("render.corner_radius must be at most half of render.box_height");
        }
        Ok(())
    }
}

/// Decode config bytes as UTF-8, dropping a BOM if present.
fn decode_text(bytes: &[u8]) -> String {
    let (cow, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        debug!("Config file contained invalid UTF-8; replaced offending bytes");
    }
    cow.into_owned()
}

/// Replace `${VAR_NAME}` with the variable's value. Unset variables stay verbatim.
fn substitute_env_vars(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("static regex");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
