use binary_reader::BinaryReader;

/// `BITD`: raw or RLE-packed pixel rows. Decoding needs the member's
/// header (dimensions, depth), so it happens at the cast layer.
pub struct BitmapChunk {
    pub data: Vec<u8>,
}

impl BitmapChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<BitmapChunk, String> {
        Ok(BitmapChunk {
            data: reader.data.clone(),
        })
    }
}

/// PackBits-style run decoding used by bitmap rows at depths >= 8.
pub fn unpack_rle(data: &[u8], expected_len: usize) -> Vec<u8> {
    if data.len() >= expected_len {
        return data[..expected_len].to_vec();
    }
    let mut out = Vec::with_capacity(expected_len);
    let mut pos = 0usize;
    while pos < data.len() && out.len() < expected_len {
        let marker = data[pos];
        pos += 1;
        if marker & 0x80 != 0 {
            let run = (257 - marker as usize).min(expected_len - out.len());
            if pos >= data.len() {
                break;
            }
            out.extend(std::iter::repeat_n(data[pos], run));
            pos += 1;
        } else {
            let count = (marker as usize + 1).min(data.len() - pos);
            let count = count.min(expected_len - out.len());
            out.extend_from_slice(&data[pos..pos + count]);
            pos += count;
        }
    }
    out.resize(expected_len, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_runs_copy_through() {
        // 0x02 means "three literal bytes follow"
        let decoded = unpack_rle(&[0x02, 1, 2, 3], 3);
        assert_eq!(decoded, vec![1, 2, 3]);
    }

    #[test]
    fn repeat_runs_expand() {
        // 0xfe means "repeat next byte 3 times"
        let decoded = unpack_rle(&[0xfe, 9], 3);
        assert_eq!(decoded, vec![9, 9, 9]);
    }

    #[test]
    fn uncompressed_data_passes_through() {
        let decoded = unpack_rle(&[1, 2, 3, 4], 4);
        assert_eq!(decoded, vec![1, 2, 3, 4]);
    }
}
