pub mod config;
pub mod deps;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod render;
