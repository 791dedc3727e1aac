//! Similarity estimation and affine warping.

use crate::core::errors::{SwapError, SwapResult};
use crate::domain::{AlignmentTransform, RawImage};
use image::RgbImage;
use nalgebra::{Matrix2, Vector2, Vector3};
use rayon::prelude::*;

/// Estimates the least-squares similarity transform (rotation, uniform scale
/// and translation) mapping `src` points onto `dst` points.
///
/// Implements the closed-form Umeyama solution. The returned transform maps
/// `src` coordinates to `dst` coordinates.
///
/// # Errors
///
/// Returns [`SwapError::InvalidInput`] when fewer than two point pairs are
/// given, the point counts differ, the source points are coincident or the
/// SVD does not converge.
pub fn estimate_similarity(src: &[[f32; 2]], dst: &[[f32; 2]]) -> SwapResult<AlignmentTransform> {
    if src.len() != dst.len() || src.len() < 2 {
        return Err(SwapError::invalid_input(format!(
            "similarity estimation needs matching point sets of at least 2, got {} and {}",
            src.len(),
            dst.len()
        )));
    }
    let n = src.len() as f32;
    let to_vec = |p: &[f32; 2]| Vector2::new(p[0], p[1]);

    let src_mean = src.iter().map(to_vec).sum::<Vector2<f32>>() / n;
    let dst_mean = dst.iter().map(to_vec).sum::<Vector2<f32>>() / n;

    let mut covariance = Matrix2::<f32>::zeros();
    let mut src_variance = 0.0f32;
    for (s, d) in src.iter().zip(dst) {
        let sc = to_vec(s) - src_mean;
        let dc = to_vec(d) - dst_mean;
        covariance += dc * sc.transpose();
        src_variance += sc.norm_squared();
    }
    covariance /= n;
    src_variance /= n;

    if src_variance <= f32::EPSILON {
        return Err(SwapError::invalid_input(
            "landmarks are coincident; cannot estimate alignment",
        ));
    }

    let svd = covariance.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => {
            return Err(SwapError::invalid_input(
                "SVD of landmark covariance did not converge",
            ));
        }
    };

    // Reflection guard: force a proper rotation.
    let mut d = Matrix2::<f32>::identity();
    if u.determinant() * v_t.determinant() < 0.0 {
        d[(1, 1)] = -1.0;
    }
    let rotation = u * d * v_t;
    let scale = (Matrix2::from_diagonal(&svd.singular_values) * d).trace() / src_variance;
    let translation = dst_mean - rotation * src_mean * scale;

    AlignmentTransform::from_affine([
        [
            scale * rotation[(0, 0)],
            scale * rotation[(0, 1)],
            translation.x,
        ],
        [
            scale * rotation[(1, 0)],
            scale * rotation[(1, 1)],
            translation.y,
        ],
    ])
}

/// Warps `image` into a `size`x`size` crop using the frame -> crop transform.
///
/// Each crop pixel is inverse-mapped into the frame and sampled bilinearly.
/// Crop pixels that fall outside the frame are black.
pub fn warp_to_crop(image: &RawImage, transform: &AlignmentTransform, size: u32) -> RawImage {
    let inv = *transform.inverse();
    let src = image.as_rgb();
    let mut dst = RgbImage::new(size, size);
    let buffer: &mut [u8] = dst.as_mut();

    buffer
        .par_chunks_mut((size * 3) as usize)
        .enumerate()
        .for_each(|(dst_y, row)| {
            for dst_x in 0..size {
                let p = inv * Vector3::new(dst_x as f32, dst_y as f32, 1.0);
                let pixel = sample_bilinear(src, p.x, p.y).unwrap_or([0.0; 3]);
                let index = (dst_x * 3) as usize;
                for c in 0..3 {
                    row[index + c] = pixel[c].round().clamp(0.0, 255.0) as u8;
                }
            }
        });

    RawImage::new(dst)
}

/// Bilinear sample at a fractional position.
///
/// Returns `None` outside `[0, width - 1] x [0, height - 1]`.
pub fn sample_bilinear(image: &RgbImage, x: f32, y: f32) -> Option<[f32; 3]> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || !x.is_finite() || !y.is_finite() {
        return None;
    }
    if x < 0.0 || y < 0.0 || x > (w - 1) as f32 || y > (h - 1) as f32 {
        return None;
    }
    let x1 = x.floor() as u32;
    let y1 = y.floor() as u32;
    let x2 = (x1 + 1).min(w - 1);
    let y2 = (y1 + 1).min(h - 1);
    let dx = x - x1 as f32;
    let dy = y - y1 as f32;

    let p11 = image.get_pixel(x1, y1).0;
    let p12 = image.get_pixel(x1, y2).0;
    let p21 = image.get_pixel(x2, y1).0;
    let p22 = image.get_pixel(x2, y2).0;

    let mut out = [0.0f32; 3];
    for (i, channel) in out.iter_mut().enumerate() {
        *channel = (1.0 - dx) * (1.0 - dy) * p11[i] as f32
            + dx * (1.0 - dy) * p21[i] as f32
            + (1.0 - dx) * dy * p12[i] as f32
            + dx * dy * p22[i] as f32;
    }
    Some(out)
}

/// Bilinear sample of a row-major single-channel buffer; `0.0` outside.
pub fn sample_scalar(values: &[f32], width: u32, height: u32, x: f32, y: f32) -> f32 {
    if width == 0 || height == 0 || !x.is_finite() || !y.is_finite() {
        return 0.0;
    }
    if x < 0.0 || y < 0.0 || x > (width - 1) as f32 || y > (height - 1) as f32 {
        return 0.0;
    }
    let x1 = x.floor() as u32;
    let y1 = y.floor() as u32;
    let x2 = (x1 + 1).min(width - 1);
    let y2 = (y1 + 1).min(height - 1);
    let dx = x - x1 as f32;
    let dy = y - y1 as f32;
    let at = |xx: u32, yy: u32| values[(yy * width + xx) as usize];
    (1.0 - dx) * (1.0 - dy) * at(x1, y1)
        + dx * (1.0 - dy) * at(x2, y1)
        + (1.0 - dx) * dy * at(x1, y2)
        + dx * dy * at(x2, y2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::FACE_TEMPLATE_512;

    #[test]
    fn test_similarity_recovers_known_transform() {
        let angle = 0.3f32;
        let scale = 1.7f32;
        let (tx, ty) = (12.0, -40.0);
        let dst: Vec<[f32; 2]> = FACE_TEMPLATE_512
            .iter()
            .map(|p| {
                [
                    scale * (angle.cos() * p[0] - angle.sin() * p[1]) + tx,
                    scale * (angle.sin() * p[0] + angle.cos() * p[1]) + ty,
                ]
            })
            .collect();
        let t = estimate_similarity(&FACE_TEMPLATE_512, &dst).unwrap();
        let affine = t.as_affine();
        assert!((affine[0][0] - scale * angle.cos()).abs() < 1e-3);
        assert!((affine[1][0] - scale * angle.sin()).abs() < 1e-3);
        assert!((affine[0][2] - tx).abs() < 1e-2);
        assert!((affine[1][2] - ty).abs() < 1e-2);
    }

    #[test]
    fn test_similarity_identity_for_equal_sets() {
        let t = estimate_similarity(&FACE_TEMPLATE_512, &FACE_TEMPLATE_512).unwrap();
        assert!(t.max_deviation(&AlignmentTransform::identity()) < 1e-3);
    }

    #[test]
    fn test_similarity_rejects_degenerate_input() {
        assert!(estimate_similarity(&[[1.0, 1.0]; 5], &FACE_TEMPLATE_512).is_err());
        assert!(estimate_similarity(&[[1.0, 1.0]], &[[2.0, 2.0]]).is_err());
    }

    #[test]
    fn test_identity_warp_preserves_pixels() {
        let mut rgb = RgbImage::new(8, 8);
        for (x, y, p) in rgb.enumerate_pixels_mut() {
            p.0 = [(x * 30) as u8, (y * 30) as u8, 7];
        }
        let img = RawImage::new(rgb);
        let out = warp_to_crop(&img, &AlignmentTransform::identity(), 8);
        assert_eq!(out, img);
    }

    #[test]
    fn test_sampling_out_of_bounds() {
        let rgb = RgbImage::new(4, 4);
        assert!(sample_bilinear(&rgb, -0.1, 0.0).is_none());
        assert!(sample_bilinear(&rgb, 3.0, 3.0).is_some());
        assert_eq!(sample_scalar(&[1.0; 4], 2, 2, 0.5, 0.5), 1.0);
        assert_eq!(sample_scalar(&[1.0; 4], 2, 2, 5.0, 0.5), 0.0);
    }
}
