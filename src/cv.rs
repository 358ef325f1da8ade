//! Adapters from OpenCV types into tracker inputs.

use ndarray::prelude::*;
use opencv::{
    core::{self, Mat, Point, Vector},
    imgproc,
    prelude::*,
};

use crate::error::Error;
use crate::frame::Frame;
use crate::region::Region;

/// Contours shorter than this (closed arc length, px) are noise.
pub const MIN_CONTOUR_LENGTH: f64 = 200.0;

/// Converts contours into regions, dropping those not longer than `min_length`.
pub fn regions_from_contours(
    contours: &Vector<Vector<Point>>,
    min_length: f64,
) -> Result<Vec<Region>, Error> {
    let mut regions = Vec::with_capacity(contours.len());

    for contour in contours.iter() {
        if imgproc::arc_length(&contour, true)? <= min_length {
            continue;
        }

        let rect = imgproc::bounding_rect(&contour)?;
        let area = imgproc::contour_area(&contour, false)?;
        let rotated = imgproc::min_area_rect(&contour)?;

        regions.push(Region::new(
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
            area as f32,
            rotated.angle,
        ));
    }

    Ok(regions)
}

/// Builds a frame from a BGR `CV_8UC3` image and a `CV_8UC1` foreground mask.
///
/// Hue comes from OpenCV's own BGR to HSV conversion, so it matches the
/// color space the foreground mask was segmented in.
pub fn frame_from_mat(bgr: &Mat, mask: &Mat, regions: Vec<Region>) -> Result<Frame, Error> {
    if bgr.typ() != core::CV_8UC3 {
        return Err(Error::UnsupportedMat(format!("image type {}", bgr.typ())));
    }

    if mask.typ() != core::CV_8UC1 {
        return Err(Error::UnsupportedMat(format!("mask type {}", mask.typ())));
    }

    let (rows, cols) = (bgr.rows() as usize, bgr.cols() as usize);
    if (mask.rows() as usize, mask.cols() as usize) != (rows, cols) {
        return Err(Error::FrameShape {
            expected: (rows, cols),
            found: (mask.rows() as usize, mask.cols() as usize),
        });
    }

    let mut hsv = Mat::default();
    imgproc::cvt_color_def(bgr, &mut hsv, imgproc::COLOR_BGR2HSV)?;

    let mut hue = Mat::default();
    core::extract_channel(&hsv, &mut hue, 0)?;

    let hue = plane(&hue, rows, cols)?;
    let mask = plane(mask, rows, cols)?.mapv(|v| v > 0);

    Frame::new(hue, mask, regions)
}

/// Copies a single-channel 8-bit `Mat` into an owned array.
fn plane(mat: &Mat, rows: usize, cols: usize) -> Result<Array2<u8>, Error> {
    // try_clone always yields a continuous buffer
    let mat = mat.try_clone()?;

    let view = ArrayView2::from_shape((rows, cols), mat.data_bytes()?)
        .map_err(|e| Error::UnsupportedMat(e.to_string()))?;

    Ok(view.to_owned())
}
