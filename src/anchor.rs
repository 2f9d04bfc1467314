//! Dense anchor grid generation over a feature map.

use nalgebra::DMatrix;

/// Geometry of the anchor grid for one feature map.
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    /// Feature map shape as (rows, cols).
    pub fmap_shape: (usize, usize),

    /// Ratio between feature-map resolution and image resolution
    /// (fmap_shape / im_shape, a concept similar to feature strides).
    pub fmap_downsampled_rate: f64,

    /// Anchor scales, in pixels of the anchor coordinate frame.
    pub scales: Vec<f64>,

    /// Width-to-height aspect ratios.
    pub ratios: Vec<f64>,

    /// Step between adjacent anchor centers on the feature-map grid.
    pub anchor_stride: usize,
}

impl AnchorConfig {
    /// Create a config with the default anchor stride of 1.
    pub fn new(
        fmap_shape: (usize, usize),
        fmap_downsampled_rate: f64,
        scales: Vec<f64>,
        ratios: Vec<f64>,
    ) -> Self {
        Self {
            fmap_shape,
            fmap_downsampled_rate,
            scales,
            ratios,
            anchor_stride: 1,
        }
    }
}

/// Generate the full cross-product anchor set for a feature map.
///
/// Every combination of grid position and (scale, ratio) pair produces one
/// box. For each pair, `height = scale / sqrt(ratio)` and
/// `width = scale * sqrt(ratio)`; grid positions advance by `anchor_stride`
/// on the feature map and are divided by `fmap_downsampled_rate` to land in
/// image coordinates.
///
/// Row order is deterministic and must stay aligned with the network output
/// channels: shift positions outer (y outer, x inner), scale/ratio pairs
/// inner (ratios outer, scales inner). Rows are `[x1, y1, x2, y2]` corners,
/// `center - 0.5 * size` to `center + 0.5 * size`.
///
/// Pure function of its numeric inputs; degenerate scale or ratio values
/// propagate into degenerate boxes without validation.
pub fn generate_anchors(config: &AnchorConfig) -> DMatrix<f64> {
    let (fmap_rows, fmap_cols) = config.fmap_shape;
    let stride = config.anchor_stride.max(1);

    // All (scale, ratio) combinations, flattened ratio-major
    let n_pairs = config.scales.len() * config.ratios.len();
    let mut heights = Vec::with_capacity(n_pairs);
    let mut widths = Vec::with_capacity(n_pairs);
    for &ratio in &config.ratios {
        for &scale in &config.scales {
            heights.push(scale / ratio.sqrt());
            widths.push(scale * ratio.sqrt());
        }
    }

    let shifts_y = strided_shifts(fmap_rows, stride, config.fmap_downsampled_rate);
    let shifts_x = strided_shifts(fmap_cols, stride, config.fmap_downsampled_rate);

    let n_boxes = shifts_y.len() * shifts_x.len() * n_pairs;
    let mut data = Vec::with_capacity(n_boxes * 4);
    for &center_y in &shifts_y {
        for &center_x in &shifts_x {
            for k in 0..n_pairs {
                let half_w = 0.5 * widths[k];
                let half_h = 0.5 * heights[k];
                data.extend_from_slice(&[
                    center_x - half_w,
                    center_y - half_h,
                    center_x + half_w,
                    center_y + half_h,
                ]);
            }
        }
    }

    DMatrix::from_row_slice(n_boxes, 4, &data)
}

/// Grid positions `0, stride, 2*stride, ...` below `extent`, rescaled into
/// image coordinates.
fn strided_shifts(extent: usize, stride: usize, fmap_downsampled_rate: f64) -> Vec<f64> {
    (0..extent)
        .step_by(stride)
        .map(|p| p as f64 / fmap_downsampled_rate)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_anchor_count() {
        // 4x6 feature map, stride 1, 2 scales x 3 ratios = 6 pairs
        let config = AnchorConfig::new(
            (4, 6),
            1.0,
            vec![8.0, 16.0],
            vec![0.5, 1.0, 2.0],
        );
        let anchors = generate_anchors(&config);
        assert_eq!(anchors.nrows(), 4 * 6 * 6);
        assert_eq!(anchors.ncols(), 4);
    }

    #[test]
    fn test_anchor_count_with_stride() {
        // ceil(5/2) = 3 positions per axis
        let mut config = AnchorConfig::new((5, 5), 1.0, vec![8.0], vec![1.0]);
        config.anchor_stride = 2;
        let anchors = generate_anchors(&config);
        assert_eq!(anchors.nrows(), 3 * 3);
    }

    #[test]
    fn test_anchor_geometry_square() {
        // Single 4x4 anchor centered on the grid origin
        let config = AnchorConfig::new((1, 1), 1.0, vec![4.0], vec![1.0]);
        let anchors = generate_anchors(&config);

        assert_eq!(anchors.nrows(), 1);
        assert_relative_eq!(anchors[(0, 0)], -2.0, epsilon = 1e-10);
        assert_relative_eq!(anchors[(0, 1)], -2.0, epsilon = 1e-10);
        assert_relative_eq!(anchors[(0, 2)], 2.0, epsilon = 1e-10);
        assert_relative_eq!(anchors[(0, 3)], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_anchor_aspect_ratio() {
        // ratio 4 gives width = scale * 2, height = scale / 2
        let config = AnchorConfig::new((1, 1), 1.0, vec![8.0], vec![4.0]);
        let anchors = generate_anchors(&config);

        let w = anchors[(0, 2)] - anchors[(0, 0)];
        let h = anchors[(0, 3)] - anchors[(0, 1)];
        assert_relative_eq!(w, 16.0, epsilon = 1e-10);
        assert_relative_eq!(h, 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_anchor_ordering_shifts_outer_pairs_inner() {
        let config = AnchorConfig::new((2, 2), 1.0, vec![2.0, 4.0], vec![1.0]);
        let anchors = generate_anchors(&config);
        assert_eq!(anchors.nrows(), 2 * 2 * 2);

        // Rows 0..2 share the (0, 0) center, pairs varying fastest
        let w0 = anchors[(0, 2)] - anchors[(0, 0)];
        let w1 = anchors[(1, 2)] - anchors[(1, 0)];
        assert_relative_eq!(w0, 2.0, epsilon = 1e-10);
        assert_relative_eq!(w1, 4.0, epsilon = 1e-10);

        // Rows 2..4 move one step in x before y advances
        let cx2 = 0.5 * (anchors[(2, 0)] + anchors[(2, 2)]);
        let cy2 = 0.5 * (anchors[(2, 1)] + anchors[(2, 3)]);
        assert_relative_eq!(cx2, 1.0, epsilon = 1e-10);
        assert_relative_eq!(cy2, 0.0, epsilon = 1e-10);

        // Last pair block sits at (x, y) = (1, 1)
        let cx7 = 0.5 * (anchors[(7, 0)] + anchors[(7, 2)]);
        let cy7 = 0.5 * (anchors[(7, 1)] + anchors[(7, 3)]);
        assert_relative_eq!(cx7, 1.0, epsilon = 1e-10);
        assert_relative_eq!(cy7, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_anchor_downsample_rate_rescales_centers() {
        // rate 0.5 maps grid position 1 to image coordinate 2
        let config = AnchorConfig::new((2, 2), 0.5, vec![4.0], vec![1.0]);
        let anchors = generate_anchors(&config);

        let cx = 0.5 * (anchors[(3, 0)] + anchors[(3, 2)]);
        let cy = 0.5 * (anchors[(3, 1)] + anchors[(3, 3)]);
        assert_relative_eq!(cx, 2.0, epsilon = 1e-10);
        assert_relative_eq!(cy, 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_empty_scales_produce_no_anchors() {
        let config = AnchorConfig::new((4, 4), 1.0, vec![], vec![1.0]);
        let anchors = generate_anchors(&config);
        assert_eq!(anchors.nrows(), 0);
    }
}
