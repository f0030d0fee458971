mod target_extractor;

pub use target_extractor::*;
