//! Frame - one rendered world snapshot

use serde::{Deserialize, Serialize};
use vivarium_common::{LogicalTime, Rgb, BACKGROUND};

/// 3-channel raster matching the universe dimensions
///
/// Each frame owns its buffer. Frames are never painted on top of a previous
/// one, so an agent that moved does not leave a trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Replay clock this frame was rendered at
    pub clock: LogicalTime,
    pub height: usize,
    pub width: usize,
    /// Tracks that consumed more than one event to reach this frame
    pub catch_ups: usize,
    /// Row-major pixels
    pixels: Vec<Rgb>,
}

impl Frame {
    /// Blank frame
    pub fn new(clock: LogicalTime, height: usize, width: usize) -> Self {
        Self {
            clock,
            height,
            width,
            catch_ups: 0,
            pixels: vec![BACKGROUND; height * width],
        }
    }

    /// Paint a cell; out-of-bounds writes are ignored
    #[inline]
    pub fn paint(&mut self, y: usize, x: usize, color: Rgb) {
        if y < self.height && x < self.width {
            self.pixels[y * self.width + x] = color;
        }
    }

    #[inline]
    pub fn get(&self, y: usize, x: usize) -> Option<Rgb> {
        if y < self.height && x < self.width {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Row-major pixel buffer
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Number of non-background cells
    pub fn painted_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p != BACKGROUND).count()
    }

    /// Nested `[row][column][channel]` view for renderers
    pub fn to_rows(&self) -> Vec<Vec<[u8; 3]>> {
        self.pixels
            .chunks(self.width.max(1))
            .take(self.height)
            .map(|row| row.iter().map(|p| p.0).collect())
            .collect()
    }
}
