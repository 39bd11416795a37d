use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, rgba: Vec<u8>) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn wav_bytes_i16(channels: u16, samples: &[i16]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut buf = Cursor::new(Vec::new());
    {
        let mut w = hound::WavWriter::new(&mut buf, spec).unwrap();
        for &s in samples {
            w.write_sample(s).unwrap();
        }
        w.finalize().unwrap();
    }
    buf.into_inner()
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let prepared = decode_image(&png_bytes(1, 1, vec![100, 50, 200, 128])).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.pixel(0, 0),
        [
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
    assert_eq!(prepared.pixel(5, 0), [0, 0, 0, 0]);
    assert_eq!(prepared.size(), Size::new(1.0, 1.0));
}

#[test]
fn decode_image_rejects_garbage() {
    assert!(decode_image(b"definitely not a png").is_err());
}

#[test]
fn decode_wav_scales_integer_samples() {
    let audio = decode_wav(&wav_bytes_i16(2, &[16_384, -32_768, 0, 32_767])).unwrap();
    assert_eq!(audio.sample_rate, 8_000);
    assert_eq!(audio.channels, 2);
    assert_eq!(audio.frames(), 2);
    assert!((audio.interleaved_f32[0] - 0.5).abs() < 1e-6);
    assert!((audio.interleaved_f32[1] + 1.0).abs() < 1e-6);
    assert!((audio.duration_secs() - 2.0 / 8_000.0).abs() < 1e-12);
}

#[test]
fn decode_wav_rejects_truncated_input() {
    let bytes = wav_bytes_i16(1, &[1, 2, 3]);
    assert!(decode_wav(&bytes[..10]).is_err());
}
