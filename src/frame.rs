use ndarray::prelude::*;

use crate::error::Error;
use crate::region::Region;

/// Everything the tracker consumes for one video frame.
///
/// `hue` and `mask` are indexed `[row, col]` and must share a shape. Hue values
/// follow the 8-bit OpenCV convention, i.e. degrees halved into [0, 180).
pub struct Frame {
    pub dims: (u32, u32),
    pub hue: Array2<u8>,
    pub mask: Array2<bool>,
    pub regions: Vec<Region>,
}

impl Frame {
    pub fn new(hue: Array2<u8>, mask: Array2<bool>, regions: Vec<Region>) -> Result<Self, Error> {
        if hue.dim() != mask.dim() {
            return Err(Error::FrameShape {
                expected: hue.dim(),
                found: mask.dim(),
            });
        }

        let (rows, cols) = hue.dim();

        Ok(Self {
            dims: (cols as u32, rows as u32),
            hue,
            mask,
            regions,
        })
    }

    /// Builds a frame from an interleaved BGR image of shape `[rows, cols, 3]`.
    pub fn from_bgr(
        image: ArrayView3<'_, u8>,
        mask: Array2<bool>,
        regions: Vec<Region>,
    ) -> Result<Self, Error> {
        let (rows, cols, channels) = image.dim();
        if channels != 3 {
            return Err(Error::Channels(channels));
        }

        let hue = Array2::from_shape_fn((rows, cols), |(r, c)| {
            hue_of_bgr(image[[r, c, 0]], image[[r, c, 1]], image[[r, c, 2]])
        });

        Self::new(hue, mask, regions)
    }

    /// A frame with no color information, only detected regions.
    ///
    /// The appearance stage sees an empty foreground and leaves stationary
    /// objects where they are.
    pub fn blank(dims: (u32, u32), regions: Vec<Region>) -> Self {
        let shape = (dims.1 as usize, dims.0 as usize);

        Self {
            dims,
            hue: Array2::zeros(shape),
            mask: Array2::from_elem(shape, false),
            regions,
        }
    }

    /// Checks that `dims`, `hue` and `mask` describe the same image.
    pub fn validate(&self) -> Result<(), Error> {
        let expected = (self.dims.1 as usize, self.dims.0 as usize);

        for found in [self.hue.dim(), self.mask.dim()] {
            if found != expected {
                return Err(Error::FrameShape { expected, found });
            }
        }

        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// 8-bit hue of a BGR pixel, in [0, 180).
pub fn hue_of_bgr(b: u8, g: u8, r: u8) -> u8 {
    let (b, g, r) = (b as f32, g as f32, r as f32);
    let max = b.max(g).max(r);
    let min = b.min(g).min(r);
    let diff = max - min;

    if diff <= 0.0 {
        return 0;
    }

    let mut h = if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };

    if h < 0.0 {
        h += 360.0;
    }

    ((h / 2.0).round() as u32 % 180) as u8
}
