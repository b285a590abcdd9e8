// SYNOID Remix Frame Features
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Fixed-size perceptual descriptor per frame: an 8x8 luma grid, the
// average hash derived from it, and scalar brightness/motion proxies.

use super::Frame;
use crate::error::Result;
use image::imageops::FilterType;

pub const GRID_SIDE: u32 = 8;
pub const GRID_LEN: usize = (GRID_SIDE * GRID_SIDE) as usize;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeatures {
    /// Downsampled luma, row-major, normalized to [0, 1]
    pub grid: [f32; GRID_LEN],
    /// Bit i set when grid[i] is brighter than the grid mean
    pub hash: u64,
    /// Mean luma in [0, 1]
    pub brightness: f32,
    /// Mean grid change against the previous decoded frame (0 for the first)
    pub motion: f32,
}

impl FrameFeatures {
    /// Build the descriptor from an 8x8 grid of luma samples (0-255)
    pub fn from_luma_grid(samples: &[u8]) -> Self {
        let mut grid = [0f32; GRID_LEN];
        for (slot, &v) in grid.iter_mut().zip(samples.iter()) {
            *slot = v as f32 / 255.0;
        }
        let brightness = grid.iter().sum::<f32>() / GRID_LEN as f32;

        let mut hash: u64 = 0;
        for (i, &v) in grid.iter().enumerate() {
            if v > brightness {
                hash |= 1 << i;
            }
        }

        Self {
            grid,
            hash,
            brightness,
            motion: 0.0,
        }
    }

    /// Decode the frame and compute its descriptor. Motion is filled in later,
    /// once the neighbouring frames are known.
    pub fn extract(frame: &Frame) -> Result<Self> {
        let img = frame.decode()?;
        let small = img
            .resize_exact(GRID_SIDE, GRID_SIDE, FilterType::Triangle)
            .to_luma8();
        Ok(Self::from_luma_grid(small.as_raw()))
    }

    /// Mean absolute grid difference in [0, 1]
    pub fn grid_distance(&self, other: &Self) -> f64 {
        let total: f32 = self
            .grid
            .iter()
            .zip(other.grid.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        (total / GRID_LEN as f32) as f64
    }

    pub fn hamming_distance(&self, other: &Self) -> u32 {
        (self.hash ^ other.hash).count_ones()
    }

    /// Perceptual similarity in [0, 1]; identical frames score 1
    pub fn similarity(&self, other: &Self) -> f64 {
        let hash_sim = 1.0 - self.hamming_distance(other) as f64 / 64.0;
        let grid_sim = 1.0 - self.grid_distance(other);
        0.5 * hash_sim + 0.5 * grid_sim
    }

    /// Difference in motion proxies, used as the continuity penalty
    pub fn motion_penalty(&self, other: &Self) -> f64 {
        (self.motion - other.motion).abs() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_grid() {
        let f = FrameFeatures::from_luma_grid(&[128u8; GRID_LEN]);
        assert_eq!(f.hash, 0);
        assert!((f.brightness - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(f.similarity(&f.clone()), 1.0);
    }

    #[test]
    fn test_half_split_hash() {
        let mut samples = [0u8; GRID_LEN];
        for s in samples.iter_mut().skip(32) {
            *s = 255;
        }
        let f = FrameFeatures::from_luma_grid(&samples);
        assert_eq!(f.hash.count_ones(), 32);
        assert_eq!(f.hash, 0xFFFF_FFFF_0000_0000);
    }

    #[test]
    fn test_black_white_least_similar() {
        let black = FrameFeatures::from_luma_grid(&[0u8; GRID_LEN]);
        let white = FrameFeatures::from_luma_grid(&[255u8; GRID_LEN]);
        let grey = FrameFeatures::from_luma_grid(&[128u8; GRID_LEN]);
        assert!((black.grid_distance(&white) - 1.0).abs() < 1e-6);
        assert!(black.similarity(&grey) > black.similarity(&white));
    }
}
