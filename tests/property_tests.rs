use proptest::prelude::*;
use yaz0::{compress, decompress, read_header, DecompressError, HEADER_SIZE};

proptest! {
    #[test]
    fn test_roundtrip_arbitrary(
        data in prop::collection::vec(any::<u8>(), 0..2048),
        level in 6..=9u8,
        alignment in any::<u32>(),
    ) {
        let compressed = compress(&data, level, alignment).unwrap();
        prop_assert_eq!(read_header(&compressed).unwrap().data_alignment, alignment);
        prop_assert_eq!(decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_roundtrip_small_alphabet(
        // few distinct symbols so matches, overlaps and long runs are common
        data in prop::collection::vec(0..4u8, 0..4096),
        level in 6..=9u8,
    ) {
        let compressed = compress(&data, level, 0).unwrap();
        prop_assert_eq!(decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_deterministic(
        data in prop::collection::vec(0..16u8, 0..4096),
        level in 6..=9u8,
    ) {
        prop_assert_eq!(compress(&data, level, 0).unwrap(), compress(&data, level, 0).unwrap());
    }

    #[test]
    fn test_truncated_never_decodes(
        data in prop::collection::vec(0..8u8, 1..1024),
        cut in 1..HEADER_SIZE,
    ) {
        let compressed = compress(&data, 9, 0).unwrap();
        let result = decompress(&compressed[..compressed.len() - cut]);
        prop_assert!(matches!(
            result,
            Err(DecompressError::TruncatedInput) | Err(DecompressError::InvalidMagic)
        ));
    }

    #[test]
    fn test_garbage_never_panics(
        body in prop::collection::vec(any::<u8>(), 0..256),
        size in 0..4096u32,
    ) {
        let mut data = yaz0::write_header(size, 0).to_vec();
        data.extend_from_slice(&body);

        if let Ok(decoded) = decompress(&data) {
            prop_assert_eq!(decoded.len(), size as usize);
        }
    }
}
