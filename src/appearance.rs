//! Color-based re-localization of stationary objects.
//!
//! Stationary fish blend into the background model and stop producing
//! contours, so their position is followed with a hue histogram instead:
//! the histogram of the object's box is back-projected over the frame and a
//! mean shift moves the box to the densest nearby match.

use log::{debug, warn};
use ndarray::prelude::*;

use crate::bbox::BoundingBox;
use crate::config::AppearanceConfig;
use crate::frame::Frame;
use crate::object::{ObjectId, ObjectState};
use crate::store::ObjectStore;

/// Integer pixel window, always inside the frame it was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Window {
    /// Rounds `bbox` to pixels and clips it to a frame of `dims` (width, height).
    pub fn clip(bbox: &BoundingBox, dims: (u32, u32)) -> Option<Self> {
        if bbox.has_negative_area() {
            return None;
        }

        let clamp = |v: f32, max: u32| v.round().max(0.0).min(max as f32) as usize;

        let x0 = clamp(bbox.x0, dims.0);
        let y0 = clamp(bbox.y0, dims.1);
        let x1 = clamp(bbox.x1(), dims.0);
        let y1 = clamp(bbox.y1(), dims.1);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Self {
            x: x0,
            y: y0,
            w: x1 - x0,
            h: y1 - y0,
        })
    }

    #[inline]
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.x as f32, self.y as f32, self.w as f32, self.h as f32)
    }

    #[inline]
    fn slice<'a, T>(&self, plane: &'a ArrayView2<'_, T>) -> ArrayView2<'a, T> {
        plane.slice(s![self.y..self.y + self.h, self.x..self.x + self.w])
    }
}

/// Hue histogram normalized so the fullest bin is 255.
#[derive(Debug, Clone, PartialEq)]
pub struct HueHistogram {
    bins: Vec<f32>,
    range: (u8, u8),
}

impl HueHistogram {
    /// Histogram of foreground pixels inside `window`; `None` when it holds none.
    pub fn from_window(
        hue: ArrayView2<'_, u8>,
        mask: ArrayView2<'_, bool>,
        window: Window,
        nbins: usize,
        range: (u8, u8),
    ) -> Option<Self> {
        let mut hist = Self {
            bins: vec![0.0; nbins.max(1)],
            range,
        };

        for (&h, &m) in window.slice(&hue).iter().zip(window.slice(&mask).iter()) {
            if !m {
                continue;
            }

            if let Some(bin) = hist.bin_of(h) {
                hist.bins[bin] += 1.0;
            }
        }

        let max = hist.bins.iter().copied().fold(0.0f32, f32::max);
        if max <= 0.0 {
            return None;
        }

        hist.bins.iter_mut().for_each(|v| *v = *v * 255.0 / max);

        Some(hist)
    }

    #[inline]
    fn bin_of(&self, h: u8) -> Option<usize> {
        let (min, max) = self.range;
        if h < min || h >= max {
            return None;
        }

        Some((h - min) as usize * self.bins.len() / (max - min) as usize)
    }

    #[inline]
    pub fn bins(&self) -> &[f32] {
        &self.bins
    }

    /// Per-pixel likelihood of belonging to the histogram, zero outside `mask`.
    pub fn back_project(&self, hue: ArrayView2<'_, u8>, mask: ArrayView2<'_, bool>) -> Array2<f32> {
        let mut prob = Array2::zeros(hue.dim());

        ndarray::Zip::from(&mut prob)
            .and(&hue)
            .and(&mask)
            .for_each(|p, &h, &m| {
                if m {
                    if let Some(bin) = self.bin_of(h) {
                        *p = self.bins[bin];
                    }
                }
            });

        prob
    }
}

/// Moves a fixed-size window to the centroid of `prob` until it settles.
///
/// Returns `None` when the starting window holds no probability mass.
pub fn mean_shift(
    prob: ArrayView2<'_, f32>,
    start: Window,
    max_iterations: usize,
    epsilon: f32,
) -> Option<Window> {
    let (rows, cols) = prob.dim();
    let mut window = start;

    for iteration in 0..max_iterations {
        let (mut m00, mut m10, mut m01) = (0.0f64, 0.0f64, 0.0f64);

        for ((r, c), &p) in window.slice(&prob).indexed_iter() {
            if p <= 0.0 {
                continue;
            }

            let p = p as f64;
            m00 += p;
            m10 += p * ((window.x + c) as f64 + 0.5);
            m01 += p * ((window.y + r) as f64 + 0.5);
        }

        if m00 <= 0.0 {
            if iteration == 0 {
                return None;
            }
            break;
        }

        let cx = m10 / m00 - window.w as f64 / 2.0;
        let cy = m01 / m00 - window.h as f64 / 2.0;

        let nx = cx.round().max(0.0).min(cols.saturating_sub(window.w) as f64) as usize;
        let ny = cy.round().max(0.0).min(rows.saturating_sub(window.h) as f64) as usize;

        let dx = nx as f32 - window.x as f32;
        let dy = ny as f32 - window.y as f32;

        window.x = nx;
        window.y = ny;

        if (dx * dx + dy * dy).sqrt() < epsilon {
            break;
        }
    }

    Some(window)
}

/// What stage 2 did during one frame.
#[derive(Debug, Default, Clone)]
pub struct AppearanceUpdate {
    pub relocated: Vec<ObjectId>,
    pub resumed: Vec<ObjectId>,
    /// Objects skipped because their box has negative dimensions.
    pub degenerate: Vec<ObjectId>,
    /// Objects with no usable foreground this frame; left where they were.
    pub unobserved: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct AppearanceTracker {
    config: AppearanceConfig,
}

impl AppearanceTracker {
    pub fn new(config: AppearanceConfig) -> Self {
        Self { config }
    }

    pub fn update(
        &self,
        store: &mut ObjectStore,
        frame_number: u64,
        frame: &Frame,
    ) -> AppearanceUpdate {
        let mut out = AppearanceUpdate::default();

        let ids: Vec<ObjectId> = store
            .in_state(ObjectState::Stationary)
            .map(|o| o.id())
            .collect();

        for id in ids {
            let bbox = match store.get(id) {
                Some(obj) => obj.bbox,
                None => continue,
            };

            if bbox.has_negative_area() {
                warn!("object {} has a degenerate box {:?}, skipped", id, bbox);
                out.degenerate.push(id);
                continue;
            }

            let window = match self.locate(frame, &bbox) {
                Some(window) => window,
                None => {
                    debug!("object {} not observed in frame {}", id, frame_number);
                    out.unobserved.push(id);
                    continue;
                }
            };

            let shift = match store.get_mut(id) {
                Some(obj) => obj.relocate(window.bbox(), frame_number),
                None => continue,
            };
            out.relocated.push(id);

            if shift.norm() > self.config.motion_threshold
                && store.transition(id, ObjectState::Stationary, ObjectState::Moving)
            {
                debug!("object {} moving again, shifted {:.1} px", id, shift.norm());
                out.resumed.push(id);
            }
        }

        out
    }

    /// New window for an object currently at `bbox`, if the frame shows it.
    fn locate(&self, frame: &Frame, bbox: &BoundingBox) -> Option<Window> {
        let window = Window::clip(bbox, frame.dims)?;

        let hist = HueHistogram::from_window(
            frame.hue.view(),
            frame.mask.view(),
            window,
            self.config.hue_bins,
            self.config.hue_range,
        )?;

        let prob = hist.back_project(frame.hue.view(), frame.mask.view());

        mean_shift(
            prob.view(),
            window,
            self.config.max_iterations,
            self.config.epsilon,
        )
    }
}
