mod compression;
pub use compression::{
    compress, compress_with_params, decompress, decompress_into, read_header, write_header,
    CompressError, DecompressError, Header, LevelParams, LevelTable, LevelTableError, Token,
    DEFAULT_LEVEL, HEADER_SIZE, MAGIC, MAX_MATCH_LENGTH, MIN_MATCH_LENGTH, WINDOW_SIZE,
};
