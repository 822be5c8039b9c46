//! Rules for reading Vietnamese line-item tables out of model text.

pub mod amounts;
pub mod labels;
pub mod patterns;
pub mod text;

pub use amounts::canonical_amount;
pub use labels::{EXACT_MATCH, LabelMatch, match_label};
pub use patterns::*;
pub use text::{collapse_whitespace, fold_label, fold_width};
