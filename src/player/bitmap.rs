use bitvec::prelude::*;

use crate::movie::chunks::bitmap::unpack_rle;
use crate::movie::chunks::cast_member::BitmapInfo;

/// Decoded raster. Pixels are ARGB32 regardless of source depth; the
/// renderer back-end decides what to do with them.
#[derive(Clone)]
pub struct Bitmap {
    pub width: i32,
    pub height: i32,
    pub bit_depth: u8,
    pub pixels: Vec<u32>,
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bitmap({}x{}@{})", self.width, self.height, self.bit_depth)
    }
}

impl Bitmap {
    pub fn new(width: i32, height: i32, bit_depth: u8) -> Bitmap {
        Bitmap {
            width,
            height,
            bit_depth,
            pixels: vec![0; (width.max(0) * height.max(0)) as usize],
        }
    }
}

const DEFAULT_GRAYS: [(u8, u8, u8); 2] = [(255, 255, 255), (0, 0, 0)];

fn argb(r: u8, g: u8, b: u8) -> u32 {
    0xff00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Expands packed member pixel data to ARGB32. 1-bit rows address the
/// palette's two poles; 8-bit rows go through the palette; 16/32-bit rows
/// carry color directly.
pub fn decode_bitmap(info: &BitmapInfo, data: &[u8], palette: Option<&[(u8, u8, u8)]>) -> Bitmap {
    let width = info.width().max(0);
    let height = info.height().max(0);
    let mut bitmap = Bitmap::new(width, height, info.bit_depth);
    if width == 0 || height == 0 {
        return bitmap;
    }

    let stride = if info.stride != 0 {
        info.stride as usize
    } else {
        bytes_per_row(width as usize, info.bit_depth)
    };
    let rows = unpack_rle(data, stride * height as usize);

    for y in 0..height as usize {
        let row = &rows[y * stride..(y + 1) * stride];
        match info.bit_depth {
            1 => {
                let bits = row.view_bits::<Msb0>();
                for x in 0..width as usize {
                    let ink = bits.get(x).map(|b| *b).unwrap_or(false);
                    let (r, g, b) = DEFAULT_GRAYS[ink as usize];
                    bitmap.pixels[y * width as usize + x] = argb(r, g, b);
                }
            }
            8 => {
                for x in 0..width as usize {
                    let index = row.get(x).copied().unwrap_or(0);
                    let (r, g, b) = palette
                        .and_then(|p| p.get(index as usize))
                        .copied()
                        .unwrap_or((index, index, index));
                    bitmap.pixels[y * width as usize + x] = argb(r, g, b);
                }
            }
            16 => {
                for x in 0..width as usize {
                    let lo = row.get(x * 2 + 1).copied().unwrap_or(0);
                    let hi = row.get(x * 2).copied().unwrap_or(0);
                    let value = ((hi as u16) << 8) | lo as u16;
                    let r = (((value >> 10) & 0x1f) << 3) as u8;
                    let g = (((value >> 5) & 0x1f) << 3) as u8;
                    let b = ((value & 0x1f) << 3) as u8;
                    bitmap.pixels[y * width as usize + x] = argb(r, g, b);
                }
            }
            32 => {
                for x in 0..width as usize {
                    let base = x * 4;
                    let r = row.get(base + 1).copied().unwrap_or(0);
                    let g = row.get(base + 2).copied().unwrap_or(0);
                    let b = row.get(base + 3).copied().unwrap_or(0);
                    bitmap.pixels[y * width as usize + x] = argb(r, g, b);
                }
            }
            _ => {
                // unsupported depth: leave the row transparent
            }
        }
    }

    bitmap
}

fn bytes_per_row(width: usize, bit_depth: u8) -> usize {
    let bits = width * bit_depth as usize;
    // rows pad to 16-bit boundaries
    bits.div_ceil(16) * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(width: i16, height: i16, depth: u8, stride: u16) -> BitmapInfo {
        BitmapInfo {
            stride,
            top: 0,
            left: 0,
            bottom: height,
            right: width,
            reg_y: 0,
            reg_x: 0,
            bit_depth: depth,
            palette_id: 0,
        }
    }

    #[test]
    fn one_bit_rows_map_to_black_and_white() {
        // 8 pixels: 1010_0000
        let bitmap = decode_bitmap(&info(8, 1, 1, 2), &[0b1010_0000, 0], None);
        assert_eq!(bitmap.pixels[0], argb(0, 0, 0));
        assert_eq!(bitmap.pixels[1], argb(255, 255, 255));
        assert_eq!(bitmap.pixels[2], argb(0, 0, 0));
    }

    #[test]
    fn eight_bit_rows_read_the_palette() {
        let palette = vec![(10, 20, 30), (40, 50, 60)];
        let bitmap = decode_bitmap(&info(2, 1, 8, 2), &[0x00, 0x01], Some(&palette));
        assert_eq!(bitmap.pixels[0], argb(10, 20, 30));
        assert_eq!(bitmap.pixels[1], argb(40, 50, 60));
    }
}
