//! CSS engine: selector tokenizer, parser and matcher; inline declarations;
//! transition timing.

pub mod tokenizer;
pub mod model;
pub mod parser;
pub mod matching;
pub mod declarations;
pub mod timing;

pub use parser::{parse_selector_list, SelectorError};
