use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use ocr::Detection;
use thiserror::Error;
use tracing::debug;

/// 默认标注颜色：纯绿。
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// 标注渲染阶段的错误。
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("载入图像失败：{path}")]
    Open {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("写入标注图像失败：{path}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// 描述标注框的绘制样式。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxStyle {
    /// 线条颜色（RGB）。
    pub color: Rgb<u8>,
    /// 线宽（像素），向外扩展；0 视为 1。
    pub thickness: u32,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            color: BOX_COLOR,
            thickness: 1,
        }
    }
}

/// 将检测框转换为 `imageproc` 矩形。
///
/// 左上角 `(left, top)` 与右下角 `(left + width, top + height)` 都包含在内，
/// 因此宽高各加一像素；零尺寸的退化框会退化为单个像素或一条线，而不是 panic。
pub fn detection_rect(detection: &Detection) -> Rect {
    let x = detection.left.min(i32::MAX as u32) as i32;
    let y = detection.top.min(i32::MAX as u32) as i32;
    let right = detection.right().min(i32::MAX as u64) as i32;
    let bottom = detection.bottom().min(i32::MAX as u64) as i32;
    Rect::at(x, y).of_size((right - x) as u32 + 1, (bottom - y) as u32 + 1)
}

/// 在图像上为每个检测结果绘制空心矩形。超出画布的部分会被裁剪。
pub fn draw_detections(image: &mut RgbImage, detections: &[Detection], style: BoxStyle) {
    let thickness = style.thickness.max(1);
    for detection in detections {
        let rect = detection_rect(detection);
        for grow in 0..thickness {
            let grown = Rect::at(
                rect.left().saturating_sub(grow as i32),
                rect.top().saturating_sub(grow as i32),
            )
            .of_size(
                rect.width().saturating_add(grow * 2),
                rect.height().saturating_add(grow * 2),
            );
            draw_hollow_rect_mut(image, grown, style.color);
        }
    }
}

/// 读取 `source`，绘制所有检测框后写入 `target`。
///
/// 输出格式由 `target` 的扩展名决定，通常与输入保持一致。
///
/// # 错误
/// - 输入无法解码时返回 [`RenderError::Open`]。
/// - 输出无法编码或写入时返回 [`RenderError::Save`]。
pub fn annotate_file(
    source: &Path,
    target: &Path,
    detections: &[Detection],
    style: BoxStyle,
) -> RenderResult<()> {
    let mut canvas = image::open(source)
        .map_err(|source_err| RenderError::Open {
            path: source.to_path_buf(),
            source: source_err,
        })?
        .to_rgb8();

    draw_detections(&mut canvas, detections, style);

    canvas.save(target).map_err(|source_err| RenderError::Save {
        path: target.to_path_buf(),
        source: source_err,
    })?;
    debug!(
        boxes = detections.len(),
        target = %target.display(),
        "annotated image written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn canvas() -> RgbImage {
        RgbImage::from_pixel(40, 30, WHITE)
    }

    #[test]
    fn rect_spans_both_corners() {
        let rect = detection_rect(&Detection::word("a", 90, 5, 3, 10, 4));
        assert_eq!((rect.left(), rect.top()), (3, 5));
        assert_eq!((rect.right(), rect.bottom()), (13, 9));
    }

    #[test]
    fn rect_near_coordinate_limit_does_not_overflow() {
        let rect = detection_rect(&Detection::word("a", 90, u32::MAX, u32::MAX - 1, 5, 5));
        assert_eq!((rect.left(), rect.top()), (i32::MAX, i32::MAX));
        assert_eq!((rect.width(), rect.height()), (1, 1));
    }

    #[test]
    fn draws_outline_only() {
        let mut img = canvas();
        draw_detections(
            &mut img,
            &[Detection::row("Hello World", 5, 3, 10, 4)],
            BoxStyle::default(),
        );
        assert_eq!(*img.get_pixel(3, 5), BOX_COLOR);
        assert_eq!(*img.get_pixel(13, 9), BOX_COLOR);
        assert_eq!(*img.get_pixel(8, 5), BOX_COLOR);
        assert_eq!(*img.get_pixel(8, 7), WHITE);
        assert_eq!(*img.get_pixel(14, 5), WHITE);
    }

    #[test]
    fn degenerate_box_marks_single_pixel() {
        let mut img = canvas();
        draw_detections(
            &mut img,
            &[Detection::word("", 0, 2, 2, 0, 0)],
            BoxStyle::default(),
        );
        assert_eq!(*img.get_pixel(2, 2), BOX_COLOR);
        assert_eq!(*img.get_pixel(3, 2), WHITE);
        assert_eq!(*img.get_pixel(2, 3), WHITE);
    }

    #[test]
    fn out_of_bounds_box_is_clipped() {
        let mut img = canvas();
        draw_detections(
            &mut img,
            &[Detection::word("far", 90, 25, 35, 100, 100)],
            BoxStyle::default(),
        );
        assert_eq!(*img.get_pixel(35, 25), BOX_COLOR);
        assert_eq!(*img.get_pixel(39, 29), WHITE);
    }

    #[test]
    fn thickness_grows_outward() {
        let mut img = canvas();
        let style = BoxStyle {
            color: Rgb([255, 0, 0]),
            thickness: 2,
        };
        draw_detections(&mut img, &[Detection::row("x", 10, 10, 5, 5)], style);
        assert_eq!(*img.get_pixel(10, 10), style.color);
        assert_eq!(*img.get_pixel(9, 9), style.color);
        assert_eq!(*img.get_pixel(11, 11), WHITE);
    }

    #[test]
    fn annotate_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.png");
        let target = dir.path().join("scan_output.png");
        canvas().save(&source).unwrap();

        annotate_file(
            &source,
            &target,
            &[Detection::word("Hi", 88, 1, 1, 6, 3)],
            BoxStyle::default(),
        )
        .unwrap();

        let written = image::open(&target).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (40, 30));
        assert_eq!(*written.get_pixel(1, 1), BOX_COLOR);
        assert_eq!(*written.get_pixel(3, 2), WHITE);
        // The source is left untouched.
        let original = image::open(&source).unwrap().to_rgb8();
        assert_eq!(*original.get_pixel(1, 1), WHITE);
    }

    #[test]
    fn annotate_file_reports_unreadable_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = annotate_file(
            &dir.path().join("missing.png"),
            &dir.path().join("out.png"),
            &[],
            BoxStyle::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::Open { .. }));
    }
}
