//! Crop extraction for recognition.
//!
//! Horizontal rectangles become direct pixel subregions clamped to the image
//! bounds; free-form quadrilaterals are perspective-rectified to an upright
//! rectangle sized from their longer opposite sides. When rotation probing is
//! configured, every crop is duplicated once per angle and tagged so the
//! post-recognition merge can keep variants apart.

use crate::core::errors::OCRError;
use crate::processors::geometry::Quad;
use crate::processors::grouping::GroupedBoxes;
use crate::processors::raster::RasterImage;
use crate::utils::transform::warp_quad;

/// One crop headed for the recognizer.
#[derive(Debug, Clone)]
pub struct CropRegion {
    /// The source polygon in original image coordinates.
    pub quad: Quad,
    /// The extracted (and possibly rotated) pixels.
    pub image: RasterImage,
    /// Rotation applied to this variant, in degrees (0 for the original).
    pub rotation_deg: i32,
}

/// Builds recognition crops from grouped boxes, horizontals first.
///
/// `rotations` lists extra probe angles; the unrotated variant always comes
/// first for each region. Regions that collapse to an empty pixel area are
/// skipped rather than failing the call.
pub fn build_crops(
    image: &RasterImage,
    boxes: &GroupedBoxes,
    rotations: &[i32],
) -> Result<Vec<CropRegion>, OCRError> {
    let mut crops = Vec::new();

    for quad in &boxes.horizontal {
        let cropped = match image.crop(
            quad.x_min().floor() as i64,
            quad.y_min().floor() as i64,
            quad.x_max().ceil() as i64,
            quad.y_max().ceil() as i64,
        ) {
            Ok(cropped) => cropped,
            Err(_) => continue,
        };
        push_variants(&mut crops, *quad, cropped, rotations)?;
    }

    for quad in &boxes.free {
        let p = &quad.0;
        // Output size follows the longer of each pair of opposite sides,
        // truncated to whole pixels.
        let width = (p[2].distance(&p[3]) as usize).max(p[1].distance(&p[0]) as usize);
        let height = (p[1].distance(&p[2]) as usize).max(p[0].distance(&p[3]) as usize);
        if width == 0 || height == 0 {
            continue;
        }
        let warped = warp_quad(image, &quad.0, width, height)?;
        push_variants(&mut crops, *quad, warped, rotations)?;
    }

    Ok(crops)
}

fn push_variants(
    crops: &mut Vec<CropRegion>,
    quad: Quad,
    image: RasterImage,
    rotations: &[i32],
) -> Result<(), OCRError> {
    for &angle in std::iter::once(&0).chain(rotations) {
        let rotated = if angle == 0 {
            image.clone()
        } else {
            image.rotate(angle)?
        };
        crops.push(CropRegion {
            quad,
            image: rotated,
            rotation_deg: angle,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::geometry::Point;
    use crate::processors::raster::ChannelOrder;

    fn gray(width: usize, height: usize) -> RasterImage {
        let data: Vec<u8> = (0..width * height).map(|i| (i % 251) as u8).collect();
        RasterImage::new(data, width, height, ChannelOrder::Gray).unwrap()
    }

    #[test]
    fn horizontal_box_becomes_subregion() {
        let img = gray(20, 10);
        let boxes = GroupedBoxes {
            horizontal: vec![Quad::from_rect(2.0, 1.0, 8.0, 5.0)],
            free: vec![],
        };
        let crops = build_crops(&img, &boxes, &[]).unwrap();
        assert_eq!(crops.len(), 1);
        assert_eq!((crops[0].image.width, crops[0].image.height), (6, 4));
        assert_eq!(crops[0].rotation_deg, 0);
    }

    #[test]
    fn off_canvas_box_is_clamped() {
        let img = gray(20, 10);
        let boxes = GroupedBoxes {
            horizontal: vec![Quad::from_rect(-5.0, -5.0, 8.0, 5.0)],
            free: vec![],
        };
        let crops = build_crops(&img, &boxes, &[]).unwrap();
        assert_eq!((crops[0].image.width, crops[0].image.height), (8, 5));
    }

    #[test]
    fn fully_outside_box_is_skipped() {
        let img = gray(20, 10);
        let boxes = GroupedBoxes {
            horizontal: vec![Quad::from_rect(30.0, 30.0, 40.0, 40.0)],
            free: vec![],
        };
        let crops = build_crops(&img, &boxes, &[]).unwrap();
        assert!(crops.is_empty());
    }

    #[test]
    fn free_box_is_warped_to_longer_sides() {
        let img = gray(20, 20);
        let quad = Quad([
            Point::new(2.0, 2.0),
            Point::new(12.0, 4.0),
            Point::new(12.0, 10.0),
            Point::new(2.0, 8.0),
        ]);
        let boxes = GroupedBoxes {
            horizontal: vec![],
            free: vec![quad],
        };
        let crops = build_crops(&img, &boxes, &[]).unwrap();
        assert_eq!(crops.len(), 1);
        // |p2-p3| = 10.2, |p1-p0| = 10.2 -> width 10; heights 6 -> height 6
        assert_eq!((crops[0].image.width, crops[0].image.height), (10, 6));
    }

    #[test]
    fn rotation_info_duplicates_crops_with_tags() {
        let img = gray(20, 10);
        let boxes = GroupedBoxes {
            horizontal: vec![Quad::from_rect(2.0, 1.0, 8.0, 5.0)],
            free: vec![],
        };
        let crops = build_crops(&img, &boxes, &[90, 180]).unwrap();
        assert_eq!(crops.len(), 3);
        assert_eq!(crops[0].rotation_deg, 0);
        assert_eq!(crops[1].rotation_deg, 90);
        assert_eq!(crops[2].rotation_deg, 180);
        assert_eq!(
            (crops[1].image.width, crops[1].image.height),
            (crops[0].image.height, crops[0].image.width)
        );
    }
}
