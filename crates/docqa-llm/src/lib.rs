//! docqa-llm
//!
//! Hosted text generation behind the `Generator` trait.

pub mod gemini;

pub use gemini::GeminiGenerator;
