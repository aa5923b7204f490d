//! Synthetic media buffers: a minimal container header followed by filler
//! bytes, sized to an exact byte count. The payload is not decodable media.

use super::types::FormatKind;

/// ISO-BMFF `ftyp` box: brand `isom`, compatible with `isom iso2 avc1 mp41`.
const FTYP_BOX: [u8; 32] = [
    0x00, 0x00, 0x00, 0x20, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0x00, 0x00, 0x02,
    0x00, b'i', b's', b'o', b'm', b'i', b's', b'o', b'2', b'a', b'v', b'c', b'1', b'm', b'p',
    b'4', b'1',
];
const MDAT_HEADER_LEN: usize = 8;

/// SOI + JFIF APP0 segment, version 1.1, 72x72 dpi, no thumbnail.
const JFIF_HEADER: [u8; 20] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x01, 0x00,
    0x48, 0x00, 0x48, 0x00, 0x00,
];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// MPEG-1 Layer III frame sync, 128 kbps / 44.1 kHz.
const MP3_FRAME_HEADER: [u8; 8] = [0xFF, 0xFB, 0x90, 0x00, 0x00, 0x00, 0x00, 0x00];

const NAL_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];
const NAL_BLOCK_LEN: usize = 1024;
const MIN_PAYLOAD_LEN: usize = 1000;

/// Length of the fixed header written for `kind`.
pub fn header_len(kind: FormatKind) -> usize {
    match kind {
        FormatKind::Video => FTYP_BOX.len() + MDAT_HEADER_LEN,
        FormatKind::Photo => JFIF_HEADER.len(),
        FormatKind::Audio => MP3_FRAME_HEADER.len(),
    }
}

/// Builds a buffer of exactly `size` bytes. For `size >= header_len(kind)`
/// the buffer starts with the full header.
pub fn generate(kind: FormatKind, size: usize) -> Vec<u8> {
    let mut buffer = match kind {
        FormatKind::Video => video(size),
        FormatKind::Photo => photo(size),
        FormatKind::Audio => audio(size),
    };
    buffer.resize(size, 0);
    buffer
}

fn video(size: usize) -> Vec<u8> {
    let payload_len = size
        .saturating_sub(FTYP_BOX.len() + MDAT_HEADER_LEN)
        .max(MIN_PAYLOAD_LEN);
    let mdat_len = u32::try_from(payload_len + MDAT_HEADER_LEN).unwrap_or(u32::MAX);

    let mut buffer = Vec::with_capacity(FTYP_BOX.len() + MDAT_HEADER_LEN + payload_len);
    buffer.extend_from_slice(&FTYP_BOX);
    buffer.extend_from_slice(&mdat_len.to_be_bytes());
    buffer.extend_from_slice(b"mdat");
    buffer.extend(nal_payload(payload_len));
    buffer
}

// 1 KiB blocks, each opening with an Annex B start code.
fn nal_payload(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    for start in (0..len).step_by(NAL_BLOCK_LEN) {
        if start + NAL_START_CODE.len() >= len {
            break;
        }
        data[start..start + NAL_START_CODE.len()].copy_from_slice(&NAL_START_CODE);
        let end = (start + NAL_BLOCK_LEN).min(len);
        for (pos, byte) in data
            .iter_mut()
            .enumerate()
            .take(end)
            .skip(start + NAL_START_CODE.len())
        {
            *byte = (pos % 256) as u8;
        }
    }
    data
}

fn photo(size: usize) -> Vec<u8> {
    let payload_len = size
        .saturating_sub(JFIF_HEADER.len() + JPEG_EOI.len())
        .max(MIN_PAYLOAD_LEN);

    let mut buffer = Vec::with_capacity(JFIF_HEADER.len() + payload_len + JPEG_EOI.len());
    buffer.extend_from_slice(&JFIF_HEADER);
    buffer.extend(ramp(payload_len));
    buffer.extend_from_slice(&JPEG_EOI);
    buffer
}

fn audio(size: usize) -> Vec<u8> {
    let payload_len = size
        .saturating_sub(MP3_FRAME_HEADER.len())
        .max(MIN_PAYLOAD_LEN);

    let mut buffer = Vec::with_capacity(MP3_FRAME_HEADER.len() + payload_len);
    buffer.extend_from_slice(&MP3_FRAME_HEADER);
    buffer.extend(ramp(payload_len));
    buffer
}

fn ramp(len: usize) -> impl Iterator<Item = u8> {
    (0..len).map(|i| (i % 256) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [FormatKind; 3] = [FormatKind::Video, FormatKind::Photo, FormatKind::Audio];

    #[test]
    fn test_exact_length_for_any_size_above_header() {
        for kind in KINDS {
            let header = header_len(kind);
            for size in [header, header + 1, 999, 1000, 1041, 4096, 65_537, 2 * 1024 * 1024] {
                if size < header {
                    continue;
                }
                assert_eq!(generate(kind, size).len(), size, "{kind:?} at {size}");
            }
        }
    }

    #[test]
    fn test_video_starts_with_ftyp_and_mdat() {
        let size = 10_000;
        let data = generate(FormatKind::Video, size);
        assert_eq!(&data[4..8], b"ftyp");
        assert_eq!(&data[8..12], b"isom");
        assert_eq!(&data[36..40], b"mdat");
        let mdat_len = u32::from_be_bytes([data[32], data[33], data[34], data[35]]) as usize;
        assert_eq!(mdat_len + FTYP_BOX.len(), size);
        assert_eq!(&data[40..44], &NAL_START_CODE);
        assert_eq!(&data[40 + 1024..40 + 1028], &NAL_START_CODE);
        assert_eq!(data[44], 4);
    }

    #[test]
    fn test_photo_is_framed_by_soi_and_eoi() {
        let data = generate(FormatKind::Photo, 5000);
        assert_eq!(&data[..4], &[0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(&data[6..10], b"JFIF");
        assert_eq!(&data[data.len() - 2..], &JPEG_EOI);
    }

    #[test]
    fn test_audio_starts_with_frame_sync() {
        let data = generate(FormatKind::Audio, 3000);
        assert_eq!(&data[..2], &[0xFF, 0xFB]);
        assert_eq!(data[8], 0);
        assert_eq!(data[9], 1);
    }

    #[test]
    fn test_small_sizes_keep_header() {
        for kind in KINDS {
            let header = header_len(kind);
            let data = generate(kind, header);
            assert_eq!(data.len(), header);
        }
        assert_eq!(&generate(FormatKind::Video, 40)[4..8], b"ftyp");
    }
}
