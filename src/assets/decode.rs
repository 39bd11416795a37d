use std::{io::Cursor, sync::Arc};

use anyhow::Context;

use crate::foundation::{
    core::Size,
    error::{ViewerError, ViewerResult},
};

#[derive(Clone, Debug)]
/// Decoded node image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Natural size, used for letterbox fitting.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Premultiplied pixel at `(x, y)`; out-of-range reads are transparent.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = &self.rgba8_premul[i..i + 4];
        [px[0], px[1], px[2], px[3]]
    }
}

#[derive(Clone, Debug)]
/// Decoded node sound stored as interleaved `f32` PCM.
pub struct PreparedAudio {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved PCM samples in [-1, 1].
    pub interleaved_f32: Arc<Vec<f32>>,
}

impl PreparedAudio {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    /// Buffer duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode any raster format supported by `image` into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ViewerResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(ViewerError::validation("image must have non-zero dimensions"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Decode a RIFF/WAVE file (integer PCM up to 32 bit, or 32-bit float) into `f32` PCM.
pub fn decode_wav(bytes: &[u8]) -> ViewerResult<PreparedAudio> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).context("read wav header")?;
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(ViewerError::validation(
            "wav must declare at least one channel and a non-zero sample rate",
        ));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .context("decode float wav samples")?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .context("decode integer wav samples")?
        }
    };

    Ok(PreparedAudio {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        interleaved_f32: Arc::new(samples),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
