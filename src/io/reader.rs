use binary_reader::BinaryReader;

use crate::utils::decode_mac_roman;

/// Reading helpers shared by every chunk decoder. The movie format mixes
/// pascal strings, SANE 80-bit floats and 7-bit var-ints into otherwise
/// fixed-layout records.
pub trait ChunkReaderExt {
    fn read_var_int(&mut self) -> Result<i32, std::io::Error>;
    fn read_pascal_string(&mut self) -> Result<String, std::io::Error>;
    fn read_text(&mut self, len: usize) -> Result<String, std::io::Error>;
    fn read_apple_float_80(&mut self) -> Result<f64, String>;
    fn eof(&self) -> bool;
    fn bytes_left(&self) -> usize;
}

impl ChunkReaderExt for BinaryReader {
    fn read_var_int(&mut self) -> Result<i32, std::io::Error> {
        let mut val: i32 = 0;
        loop {
            let b = self.read_u8()?;
            val = (val << 7) | ((b & 0x7f) as i32);
            if b >> 7 == 0 {
                break;
            }
        }
        Ok(val)
    }

    fn read_pascal_string(&mut self) -> Result<String, std::io::Error> {
        let len = self.read_u8()? as usize;
        self.read_text(len)
    }

    fn read_text(&mut self, len: usize) -> Result<String, std::io::Error> {
        let bytes = self.read_bytes(len)?;
        Ok(decode_mac_roman(bytes))
    }

    fn read_apple_float_80(&mut self) -> Result<f64, String> {
        // 80-bit SANE extended: 1 sign bit, 15 exponent bits, explicit
        // integer bit plus 63 fraction bits.
        let data = self.read_bytes(10).map_err(|e| e.to_string())?;
        let exponent = u16::from_be_bytes([data[0], data[1]]);
        let f64sign: u64 = ((exponent & 0x8000) as u64) << 48;
        let exponent = exponent & 0x7fff;

        let fraction_bytes = [
            data[2], data[3], data[4], data[5], data[6], data[7], data[8], data[9],
        ];
        let mut fraction = u64::from_be_bytes(fraction_bytes);
        fraction &= 0x7fff_ffff_ffff_ffff;

        let f64exp: u64 = if exponent == 0 {
            0
        } else if exponent == 0x7fff {
            0x7ff
        } else {
            let normexp = exponent as i64 - 0x3fff;
            if !(-0x3fe..0x3ff).contains(&normexp) {
                return Err("float exponent out of double range".to_string());
            }
            (normexp + 0x3ff) as u64
        };

        let f64bin = f64sign | (f64exp << 52) | (fraction >> 11);
        Ok(f64::from_be_bytes(f64bin.to_be_bytes()))
    }

    fn eof(&self) -> bool {
        self.pos >= self.length
    }

    fn bytes_left(&self) -> usize {
        self.length.saturating_sub(self.pos)
    }
}

pub fn big_endian_reader(data: &[u8]) -> BinaryReader {
    let mut reader = BinaryReader::from_u8(data);
    reader.set_endian(binary_reader::Endian::Big);
    reader
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_int_spans_multiple_bytes() {
        let mut reader = big_endian_reader(&[0x81, 0x00, 0x05]);
        assert_eq!(reader.read_var_int().unwrap(), 0x80);
        assert_eq!(reader.read_var_int().unwrap(), 5);
    }

    #[test]
    fn pascal_string_reads_length_prefix() {
        let mut reader = big_endian_reader(&[3, b'a', b'b', b'c', 9]);
        assert_eq!(reader.read_pascal_string().unwrap(), "abc");
        assert_eq!(reader.bytes_left(), 1);
    }

    #[test]
    fn apple_float_80_round_numbers() {
        // 1.0 in SANE extended: exponent 0x3fff, fraction msb set
        let bytes = [0x3f, 0xff, 0x80, 0, 0, 0, 0, 0, 0, 0];
        let mut reader = big_endian_reader(&bytes);
        assert_eq!(reader.read_apple_float_80().unwrap(), 1.0);
    }
}
