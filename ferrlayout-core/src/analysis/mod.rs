pub mod bbox;
pub mod labels;
