mod compress;
mod decompress;
mod header;
mod levels;
mod matcher;

pub use compress::{compress, compress_with_params, CompressError};
pub use decompress::{decompress, decompress_into, DecompressError};
pub use header::{read_header, write_header, Header, HEADER_SIZE, MAGIC};
pub use levels::{LevelParams, LevelTable, LevelTableError, DEFAULT_LEVEL};

/// Largest distance a back-reference can reach.
pub const WINDOW_SIZE: usize = 0x1000;
/// Shortest back-reference the encoder will emit.
pub const MIN_MATCH_LENGTH: usize = 3;
/// Longest back-reference the 3-byte form can express.
pub const MAX_MATCH_LENGTH: usize = 0xff + 0x12;

// longest match that still fits the 2-byte form
const MAX_SHORT_MATCH_LENGTH: usize = 0x0f + 2;
const TOKENS_PER_GROUP: usize = 8;

/// One unit of the token stream.
///
/// `offset` counts backwards from the current write position (1 is the byte
/// just written). `length` may exceed `offset`, in which case the copy
/// repeats the last `offset` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    Match { offset: u16, length: u16 },
}

impl Token {
    pub const fn is_literal(&self) -> bool {
        matches!(self, Token::Literal(_))
    }
}
