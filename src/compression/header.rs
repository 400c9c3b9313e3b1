use super::DecompressError;

pub const MAGIC: [u8; 4] = *b"Yaz0";
pub const HEADER_SIZE: usize = 16;

/// The fixed 16 byte header in front of every stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub uncompressed_size: u32,
    /// Alignment the consumer should place the decoded buffer at, 0 if none.
    pub data_alignment: u32,
    pub reserved: u32,
}

impl Header {
    pub const fn new(uncompressed_size: u32, data_alignment: u32) -> Self {
        Self {
            uncompressed_size,
            data_alignment,
            reserved: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&MAGIC);
        bytes[4..8].copy_from_slice(&self.uncompressed_size.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.data_alignment.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.reserved.to_be_bytes());
        bytes
    }
}

pub fn write_header(uncompressed_size: u32, data_alignment: u32) -> [u8; HEADER_SIZE] {
    Header::new(uncompressed_size, data_alignment).to_bytes()
}

/// Parse and validate the header at the start of `src`.
///
/// A non-zero reserved field is accepted with a warning and kept in
/// [`Header::reserved`].
pub fn read_header(src: &[u8]) -> Result<Header, DecompressError> {
    let bytes: &[u8; HEADER_SIZE] = src
        .get(..HEADER_SIZE)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(DecompressError::TruncatedInput)?;

    if bytes[0..4] != MAGIC {
        return Err(DecompressError::InvalidMagic);
    }

    let field = |start: usize| {
        u32::from_be_bytes([
            bytes[start],
            bytes[start + 1],
            bytes[start + 2],
            bytes[start + 3],
        ])
    };

    let header = Header {
        uncompressed_size: field(4),
        data_alignment: field(8),
        reserved: field(12),
    };

    if header.reserved != 0 {
        log::warn!(
            "Header reserved field is {:#010x}, expected 0",
            header.reserved
        );
    }

    Ok(header)
}
