pub mod header_utils;
pub mod target_utils;
