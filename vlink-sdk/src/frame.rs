//! Raw camera frame decoding.
//!
//! The vehicle exposes the latest camera frame as uncompressed pixel bytes in
//! shared memory, served over HTTP (see [`Client::fetch_shm`]). This module
//! interprets those bytes per the pixel format and dimensions reported in the
//! frame metadata. Debug/experimental path: the shared-memory layout is not a
//! stable contract, and a decode failure never affects the session.
//!
//! [`Client::fetch_shm`]: crate::blocking::Client::fetch_shm

use image::RgbImage;
use thiserror::Error;

/// Pixel format of a raw frame, as reported in the frame metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed RGB, 3 bytes per pixel. Wire code 1002.
    Rgb,
    /// Packed YUV 4:2:2 in UYVY byte order, 2 bytes per pixel. Wire code 1009.
    Uyvy,
}
impl PixelFormat {
    /// Parses the numeric format code from the frame metadata.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1002 => Some(Self::Rgb),
            1009 => Some(Self::Uyvy),
            _ => None,
        }
    }

    /// Bytes occupied by one pixel on the wire.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Uyvy => 2,
        }
    }
}

/// Represents to a frame decoding error.
#[derive(Debug, Clone, Error)]
pub enum FrameError {
    #[error("frame buffer too short: need {expected} bytes, got {actual}")]
    ShortBuffer { expected: usize, actual: usize },

    #[error("UYVY frames require an even width, got {0}")]
    OddWidth(u32),
}

/// Decodes raw pixel bytes into an RGB image.
///
/// Trailing bytes beyond `width * height * bytes_per_pixel` are ignored; a
/// buffer shorter than that is an error.
pub fn decode_frame(
    bytes: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<RgbImage, FrameError> {
    let pixels = width as usize * height as usize;
    let expected = pixels * format.bytes_per_pixel();
    if bytes.len() < expected {
        return Err(FrameError::ShortBuffer {
            expected,
            actual: bytes.len(),
        });
    }

    let rgb = match format {
        PixelFormat::Rgb => bytes[..expected].to_vec(),
        PixelFormat::Uyvy => {
            if width % 2 != 0 {
                return Err(FrameError::OddWidth(width));
            }
            let mut rgb = Vec::with_capacity(pixels * 3);
            // U Y0 V Y1 covers two horizontally adjacent pixels.
            for quad in bytes[..expected].chunks_exact(4) {
                let (u, y0, v, y1) = (quad[0], quad[1], quad[2], quad[3]);
                rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
                rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
            }
            rgb
        }
    };
    RgbImage::from_raw(width, height, rgb).ok_or(FrameError::ShortBuffer {
        expected,
        actual: bytes.len(),
    })
}

/// BT.601 limited-range YUV to full-range RGB, fixed point.
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = 298 * (y as i32 - 16);
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let clamp = |x: i32| ((x + 128) >> 8).clamp(0, 255) as u8;
    [
        clamp(c + 409 * e),
        clamp(c - 100 * d - 208 * e),
        clamp(c + 516 * d),
    ]
}
