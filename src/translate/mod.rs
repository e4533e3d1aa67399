pub mod interface;
pub mod mymemory;

pub use interface::{TranslateInterface, TranslateRequest, TranslateResponse};
pub use mymemory::MyMemoryTranslator;
