//! Brand mention and citation detection over answer-engine text.
//!
//! Everything here is pure and deterministic: identical inputs produce
//! identical outputs, and nothing performs I/O. Precision controls are
//! organised as an ordered pipeline of small rules (see [`rules`]) so each
//! one can be tested on its own.

pub mod citations;
pub mod detector;
pub mod lexicon;
pub mod normalize;
pub mod rules;

pub use citations::{build_citation_records, extract_urls_from_text, normalize_url, NormalizedUrl};
pub use detector::{detect, detect_answer, parse_answer, Detection};
pub use normalize::normalize_answer_text;
