pub mod interface;
pub mod tesseract;
pub mod ocr_space;
pub mod factory;

pub use interface::{OcrInterface, OcrResult};
pub use factory::OcrFactory;
