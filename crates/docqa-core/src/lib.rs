#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

/// Returned without calling the generator when retrieval finds nothing.
pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find relevant information in the knowledge base. Please make sure PDFs are ingested.";

/// The only text delivery surfaces may show when a query fails.
pub const APOLOGY_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";
