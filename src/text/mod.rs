//! Text utilities shared by the extractors and the matching engine.

pub mod encoding;
pub mod normalize;

pub use encoding::{decode_chain, decode_strict_chain, decode_utf16le, latin1, Candidate};
pub use normalize::{digits_only, normalize_text};
