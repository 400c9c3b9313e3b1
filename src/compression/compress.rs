use super::{
    header::write_header, matcher::MatchFinder, LevelParams, LevelTable, Token, HEADER_SIZE,
    MAX_SHORT_MATCH_LENGTH, TOKENS_PER_GROUP,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompressError {
    #[error("Compression level {0} is not supported")]
    UnsupportedLevel(u8),
    #[error("Input of {0} bytes is too large for a Yaz0 header")]
    InputTooLarge(usize),
}

impl Token {
    fn encode(&self, dst: &mut Vec<u8>) {
        match *self {
            Token::Literal(value) => dst.push(value),
            Token::Match { offset, length } => {
                let [upper, lower] = (offset - 1).to_be_bytes();

                if length as usize <= MAX_SHORT_MATCH_LENGTH {
                    dst.push(((length - 2) as u8) << 4 | upper);
                    dst.push(lower);
                } else {
                    dst.extend_from_slice(&[upper, lower, (length - 0x12) as u8]);
                }
            }
        }
    }
}

/// Pack tokens into groups of a flag byte followed by up to 8 tokens.
fn pack(tokens: &[Token], dst: &mut Vec<u8>) {
    for group in tokens.chunks(TOKENS_PER_GROUP) {
        let flags = group
            .iter()
            .enumerate()
            .filter(|(_, token)| token.is_literal())
            .fold(0u8, |flags, (i, _)| flags | (0x80 >> i));

        dst.push(flags);
        for token in group {
            token.encode(dst);
        }
    }
}

/// Compress `src` at one of the levels of the inbuilt [`LevelTable`].
///
/// `data_alignment` is only stored in the header.
pub fn compress(src: &[u8], level: u8, data_alignment: u32) -> Result<Vec<u8>, CompressError> {
    let params = LevelTable::inbuilt()
        .get(level)
        .ok_or(CompressError::UnsupportedLevel(level))?;

    compress_with_params(src, params, data_alignment)
}

pub fn compress_with_params(
    src: &[u8],
    params: &LevelParams,
    data_alignment: u32,
) -> Result<Vec<u8>, CompressError> {
    let uncompressed_size =
        u32::try_from(src.len()).map_err(|_| CompressError::InputTooLarge(src.len()))?;

    let tokens = MatchFinder::new(src, *params).parse();

    let mut result = Vec::with_capacity(HEADER_SIZE + src.len() + src.len().div_ceil(8));
    result.extend_from_slice(&write_header(uncompressed_size, data_alignment));
    pack(&tokens, &mut result);

    log::debug!(
        "Compressed {} bytes into {} at level {} ({} tokens)",
        src.len(),
        result.len(),
        params.level,
        tokens.len()
    );

    Ok(result)
}
