//! Output side: the JSON document form and a plain-text listing.
pub mod json;
pub mod text;
