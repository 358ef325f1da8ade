use clap::Parser;
use opencv::{
    core::{self, Mat, Point, Rect, Scalar, Size, Vector},
    highgui, imgproc,
    prelude::*,
    videoio,
};
use std::path::PathBuf;

use fishtrack::{cv, BoundingBox, MultistageTracker, TrackedObject, TrackerConfig};

#[derive(Debug, Parser)]
#[command(name = "count", about = "Count fish passing through a fixed camera view")]
struct Args {
    /// Video to analyze
    video: PathBuf,
    /// Skip this many frames before analyzing
    #[arg(short, long, default_value_t = 0)]
    skip: usize,
    /// Tracker configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Lowest fish hue (OpenCV scale, 0-179)
    #[arg(long, default_value_t = 75)]
    hue_min: u8,
    /// Highest fish hue, inclusive
    #[arg(long, default_value_t = 100)]
    hue_max: u8,
    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,
    #[arg(long)]
    headless: bool,
}

fn segment(image: &Mat, args: &Args) -> Result<Mat, anyhow::Error> {
    let mut hsv = Mat::default();
    imgproc::cvt_color_def(image, &mut hsv, imgproc::COLOR_BGR2HSV)?;

    let mut mask = Mat::default();
    core::in_range(
        &hsv,
        &Scalar::new(args.hue_min as f64, 0.0, 100.0, 0.0),
        &Scalar::new(args.hue_max as f64, 100.0, 255.0, 0.0),
        &mut mask,
    )?;

    let kernel = imgproc::get_structuring_element_def(imgproc::MORPH_ELLIPSE, Size::new(3, 3))?;
    let mut closed = Mat::default();
    imgproc::morphology_ex(
        &mask,
        &mut closed,
        imgproc::MORPH_CLOSE,
        &kernel,
        Point::new(-1, -1),
        15,
        core::BORDER_CONSTANT,
        imgproc::morphology_default_border_value()?,
    )?;

    let mut cleaned = Mat::default();
    imgproc::morphology_ex(
        &closed,
        &mut cleaned,
        imgproc::MORPH_OPEN,
        &kernel,
        Point::new(-1, -1),
        3,
        core::BORDER_CONSTANT,
        imgproc::morphology_default_border_value()?,
    )?;

    Ok(cleaned)
}

fn draw_boxes<'a, I>(image: &mut Mat, objects: I, color: Scalar) -> Result<(), anyhow::Error>
where
    I: Iterator<Item = &'a TrackedObject>,
{
    for obj in objects {
        let BoundingBox {
            x0,
            y0,
            width,
            height,
        } = obj.bbox;

        imgproc::rectangle_def(
            image,
            Rect::new(x0 as i32, y0 as i32, width as i32, height as i32),
            color,
        )?;
    }

    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(args.log_level)
        .chain(std::io::stderr())
        .apply()?;

    let config = match &args.config {
        Some(path) => TrackerConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => {
            let mut config = TrackerConfig::default();
            config.appearance = config
                .appearance
                .with_detector_hues(args.hue_min, args.hue_max);
            config
        }
    };
    let mut tracker = MultistageTracker::with_config(config)?;

    let window = "Fish Counter";
    if !args.headless {
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
    }

    let mut capture = videoio::VideoCapture::from_file(
        args.video.to_string_lossy().as_ref(),
        videoio::CAP_ANY,
    )?;

    let mut image = Mat::default();
    let mut skip = args.skip;

    while capture.read(&mut image)? && !image.empty() {
        if skip > 0 {
            skip -= 1;
            continue;
        }

        let mask = segment(&image, &args)?;

        let mut contours: Vector<Vector<Point>> = Vector::new();
        imgproc::find_contours_def(
            &mask,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
        )?;

        let regions = cv::regions_from_contours(&contours, cv::MIN_CONTOUR_LENGTH)?;
        let frame = cv::frame_from_mat(&image, &mask, regions)?;
        let report = tracker.track(&frame)?;

        if args.headless {
            continue;
        }

        let mut display = image.try_clone()?;
        draw_boxes(
            &mut display,
            tracker.potential_objects(),
            Scalar::new(0.0, 255.0, 255.0, 0.0),
        )?;
        draw_boxes(
            &mut display,
            tracker.moving_objects(),
            Scalar::new(255.0, 0.0, 0.0, 0.0),
        )?;
        draw_boxes(
            &mut display,
            tracker.stationary_objects(),
            Scalar::new(0.0, 0.0, 255.0, 0.0),
        )?;
        imgproc::put_text_def(
            &mut display,
            &format!("Count: {}", report.count),
            Point::new(20, 40),
            imgproc::FONT_HERSHEY_SIMPLEX,
            1.0,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
        )?;

        highgui::imshow(window, &display)?;

        // Escape
        if highgui::wait_key(10)? == 27 {
            break;
        }
    }

    println!("Fish count: {}", tracker.count());

    Ok(())
}
