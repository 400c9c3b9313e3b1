use super::{header::read_header, Token, HEADER_SIZE, MAX_MATCH_LENGTH, TOKENS_PER_GROUP};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompressError {
    #[error("Data does not start with the Yaz0 magic")]
    InvalidMagic,
    #[error("Input ended before the stream was complete")]
    TruncatedInput,
    #[error("Back-reference at {position:#x} reaches {offset} bytes back, before the start of the output")]
    CorruptOffset { offset: usize, position: usize },
    #[error("Back-reference of {length} bytes at {position:#x} runs past the end of the output")]
    CopyOutOfBounds { position: usize, length: usize },
    #[error("Output buffer holds {available} bytes but {required} are needed")]
    OutputTooSmall { required: usize, available: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitFlag,
    ReplayGroup { flags: u8, remaining: usize },
    Done,
}

impl Token {
    fn decode(literal: bool, decompressor: &mut Decompressor) -> Result<Self, DecompressError> {
        if literal {
            return Ok(Self::Literal(decompressor.read()?));
        }

        let first = decompressor.read()?;
        let second = decompressor.read()?;

        let distance = u16::from_be_bytes([first & 0x0f, second]);
        let length = match first >> 4 {
            0 => u16::from(decompressor.read()?) + 0x12,
            nibble => u16::from(nibble) + 2,
        };

        Ok(Self::Match {
            offset: distance + 1,
            length,
        })
    }
}

/// Replays a token stream into a buffer sized to the decoded length.
#[derive(Debug)]
struct Decompressor<'src, 'dst> {
    src: &'src [u8],
    dst: &'dst mut [u8],

    /// index to read from
    read_index: usize,
    /// index to write to, everything before it is the window
    write_index: usize,

    state: State,
}

impl<'src, 'dst> Decompressor<'src, 'dst> {
    fn new(src: &'src [u8], dst: &'dst mut [u8]) -> Self {
        Self {
            src,
            dst,

            read_index: HEADER_SIZE,
            write_index: 0,

            state: State::AwaitFlag,
        }
    }

    fn decompress(mut self) -> Result<usize, DecompressError> {
        loop {
            self.state = match self.state {
                State::AwaitFlag => self.await_flag()?,
                State::ReplayGroup { flags, remaining } => self.replay(flags, remaining)?,
                State::Done => break,
            };
        }

        Ok(self.write_index)
    }

    fn is_full(&self) -> bool {
        self.write_index == self.dst.len()
    }

    fn await_flag(&mut self) -> Result<State, DecompressError> {
        if self.is_full() {
            return Ok(State::Done);
        }

        let flags = self.read()?;
        log::trace!("group at {:#x}: flags {:08b}", self.read_index - 1, flags);

        Ok(State::ReplayGroup {
            flags,
            remaining: TOKENS_PER_GROUP,
        })
    }

    fn replay(&mut self, flags: u8, remaining: usize) -> Result<State, DecompressError> {
        // the last group may stop early, its remaining bits are never read
        if self.is_full() {
            return Ok(State::Done);
        }
        if remaining == 0 {
            return Ok(State::AwaitFlag);
        }

        let token = Token::decode(flags & 0x80 != 0, self)?;
        log::trace!("token: {:?}", token);

        match token {
            Token::Literal(value) => self.push(value),
            Token::Match { offset, length } => self.copy_backread(offset, length)?,
        }

        Ok(State::ReplayGroup {
            flags: flags << 1,
            remaining: remaining - 1,
        })
    }

    fn read(&mut self) -> Result<u8, DecompressError> {
        let value = *self
            .src
            .get(self.read_index)
            .ok_or(DecompressError::TruncatedInput)?;
        self.read_index += 1;

        Ok(value)
    }

    fn push(&mut self, value: u8) {
        self.dst[self.write_index] = value;
        self.write_index += 1;
    }

    fn copy_backread(&mut self, offset: u16, length: u16) -> Result<(), DecompressError> {
        let (offset, length) = (offset as usize, length as usize);

        if offset > self.write_index {
            return Err(DecompressError::CorruptOffset {
                offset,
                position: self.write_index,
            });
        }
        if self.write_index + length > self.dst.len() {
            return Err(DecompressError::CopyOutOfBounds {
                position: self.write_index,
                length,
            });
        }

        // byte by byte, source and destination overlap when length > offset
        for _ in 0..length {
            let value = self.dst[self.write_index - offset];
            self.push(value);
        }

        Ok(())
    }
}

/// Upper bound on how many bytes a token stream of `len` bytes can produce.
///
/// The densest encoding is a 3-byte match of maximum length, so no valid
/// stream expands by more than `MAX_MATCH_LENGTH / 3`.
fn max_expansion(len: usize) -> usize {
    len.saturating_mul(MAX_MATCH_LENGTH / 3)
}

/// Decompress a complete Yaz0 stream.
pub fn decompress(src: &[u8]) -> Result<Vec<u8>, DecompressError> {
    let header = read_header(src)?;
    let size = header.uncompressed_size as usize;

    // a header promising more than the payload could ever hold is a truncated stream,
    // reject it before allocating
    if size > max_expansion(src.len() - HEADER_SIZE) {
        return Err(DecompressError::TruncatedInput);
    }

    let mut dst = vec![0; size];
    let written = Decompressor::new(src, &mut dst).decompress()?;
    log::debug!("Decompressed {} bytes into {}", src.len(), written);

    Ok(dst)
}

/// Decompress a complete Yaz0 stream into `dst`, returning the number of bytes written.
///
/// `dst` may be larger than the decoded data, anything past the decoded length is
/// left untouched.
pub fn decompress_into(src: &[u8], dst: &mut [u8]) -> Result<usize, DecompressError> {
    let header = read_header(src)?;
    let size = header.uncompressed_size as usize;

    if dst.len() < size {
        return Err(DecompressError::OutputTooSmall {
            required: size,
            available: dst.len(),
        });
    }

    let written = Decompressor::new(src, &mut dst[..size]).decompress()?;
    log::debug!("Decompressed {} bytes into {}", src.len(), written);

    Ok(written)
}
