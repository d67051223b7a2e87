mod table;
mod tokenizer;
pub mod topk;

pub use table::{FrequencyTable, KeyBounds};
pub use tokenizer::{MIN_TOKEN_LEN, TOKEN_LEN_LIMIT, Tokens, tokenize};
pub use topk::{RankedEntry, select};
