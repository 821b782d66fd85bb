//! Video frame types and processing

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::CameraError;

/// Axis-aligned rectangle in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top half of the region (where eyes are searched for)
    pub fn upper_half(&self) -> Region {
        Region {
            height: self.height / 2,
            ..*self
        }
    }

    /// Intersect with a `width` x `height` image, `None` if nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(Region::new(self.x, self.y, w, h))
    }
}

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Monotonic capture timestamp (nanoseconds since the clock origin)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        timestamp_ns: u64,
        sequence: u32,
    ) -> Result<Self, CameraError> {
        let expected = (width as usize) * (height as usize) * 3;
        if data.len() != expected {
            return Err(CameraError::Buffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        })
    }

    /// Capture timestamp as an offset from the clock origin
    pub fn timestamp(&self) -> Duration {
        Duration::from_nanos(self.timestamp_ns)
    }

    /// Get pixel at (x, y)
    #[cfg(test)]
    pub(crate) fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Convert to grayscale
    pub fn to_grayscale(&self) -> GrayFrame {
        let mut gray = Vec::with_capacity((self.width * self.height) as usize);
        for pixel in self.data.chunks_exact(3) {
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            let y = (pixel[0] as f32 * 0.299
                   + pixel[1] as f32 * 0.587
                   + pixel[2] as f32 * 0.114) as u8;
            gray.push(y);
        }
        GrayFrame {
            data: gray,
            width: self.width,
            height: self.height,
        }
    }
}

/// Single-channel luminance image handed to the detectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    /// Luma data (width * height)
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl GrayFrame {
    #[cfg(test)]
    pub(crate) fn get_pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[(y * self.width + x) as usize])
    }

    /// Crop a region of the frame, clipped to the frame bounds
    pub fn crop(&self, region: &Region) -> Option<GrayFrame> {
        let region = region.clamp_to(self.width, self.height)?;

        let mut cropped = Vec::with_capacity((region.width * region.height) as usize);
        for row in region.y..(region.y + region.height) {
            let start = (row * self.width + region.x) as usize;
            let end = start + region.width as usize;
            cropped.extend_from_slice(&self.data[start..end]);
        }

        Some(GrayFrame {
            data: cropped,
            width: region.width,
            height: region.height,
        })
    }
}
