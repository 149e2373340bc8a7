use binary_reader::{BinaryReader, Endian};

/// `snd ` / `ediM`: audio payload with whatever metadata the header
/// yields. Decoding and playback belong to the host's audio back-end.
#[derive(Clone)]
pub struct SoundChunk {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub codec: String,
    pub data: Vec<u8>,
}

impl SoundChunk {
    /// Classic `snd ` resource: format 1 or 2 header followed by a sound
    /// data header with rate/length/encoding.
    pub fn from_snd_chunk(reader: &mut BinaryReader) -> Result<SoundChunk, String> {
        reader.set_endian(Endian::Big);

        let format = reader.read_u16().map_err(|e| e.to_string())?;
        match format {
            1 => {
                let modifier_count = reader.read_u16().map_err(|e| e.to_string())?;
                for _ in 0..modifier_count {
                    let _modifier = reader.read_u16().map_err(|e| e.to_string())?;
                    let _init = reader.read_u32().map_err(|e| e.to_string())?;
                }
            }
            2 => {
                let _ref_count = reader.read_u16().map_err(|e| e.to_string())?;
            }
            _ => return Err(format!("unknown snd format {}", format)),
        }
        let command_count = reader.read_u16().map_err(|e| e.to_string())?;
        for _ in 0..command_count {
            let _cmd = reader.read_u16().map_err(|e| e.to_string())?;
            let _param1 = reader.read_u16().map_err(|e| e.to_string())?;
            let _param2 = reader.read_u32().map_err(|e| e.to_string())?;
        }

        let _data_pointer = reader.read_u32().map_err(|e| e.to_string())?;
        let length = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let rate = reader.read_u32().map_err(|e| e.to_string())?;
        let _loop_start = reader.read_u32().map_err(|e| e.to_string())?;
        let _loop_end = reader.read_u32().map_err(|e| e.to_string())?;
        let encoding = reader.read_u8().map_err(|e| e.to_string())?;
        let _base_frequency = reader.read_u8().map_err(|e| e.to_string())?;

        let (channels, bits) = match encoding {
            0x00 => (1u16, 8u16),
            _ => (1u16, 16u16),
        };
        let data = reader
            .read_bytes(length.min(reader.length - reader.pos))
            .map_err(|e| e.to_string())?
            .to_vec();

        Ok(SoundChunk {
            channels,
            // the rate field is 16.16 fixed point
            sample_rate: rate >> 16,
            bits_per_sample: bits,
            codec: "pcm".to_string(),
            data,
        })
    }

    /// External media payloads carry a compressed stream (typically MP3);
    /// the bytes pass through untouched.
    pub fn from_media_chunk(reader: &mut BinaryReader) -> Result<SoundChunk, String> {
        Ok(SoundChunk {
            channels: 2,
            sample_rate: 0,
            bits_per_sample: 16,
            codec: "mp3".to_string(),
            data: reader.data.clone(),
        })
    }
}
