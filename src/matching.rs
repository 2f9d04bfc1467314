//! Anchor-to-ground-truth matching for training-target construction.

use nalgebra::DMatrix;

use crate::overlap::calc_overlap;
use crate::{Error, Result};

/// IoU thresholds splitting anchors into positive, negative, and ignore.
#[derive(Debug, Clone, Copy)]
pub struct MatchThresholds {
    /// Anchors whose best IoU exceeds this become positive.
    pub hi: f64,
    /// Anchors whose best IoU falls below this become negative.
    pub lo: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self { hi: 0.7, lo: 0.3 }
    }
}

/// Result of matching an anchor set against ground truth.
#[derive(Debug, Clone)]
pub struct AnchorMatch {
    /// Indices of anchors labeled positive.
    pub positive: Vec<usize>,
    /// Indices of anchors labeled negative.
    pub negative: Vec<usize>,
    /// Best-matching ground-truth box per anchor (n_anchors x 4), already
    /// scaled into the anchor coordinate frame. Rows are meaningful only
    /// for positive anchors; with empty ground truth the matrix is zeroed.
    pub matched_gt: DMatrix<f64>,
}

/// Assign a positive/negative/ignore label to every anchor.
///
/// Ground-truth boxes are scaled by `fmap_downsampled_rate` into the anchor
/// coordinate frame, then scored against the anchors with [`calc_overlap`].
/// Labels are assigned with positive rules taking precedence:
///
/// 1. For each ground-truth box, the anchor with the highest IoU is positive
///    regardless of threshold, so every ground-truth box keeps at least one
///    assigned anchor. Ties go to the lowest anchor index.
/// 2. Anchors whose best IoU exceeds `thresholds.hi` are positive.
/// 3. Anchors not already positive whose best IoU falls below
///    `thresholds.lo` are negative.
/// 4. Everything else is ignored (in neither set).
///
/// The precedence makes `lo > hi` a well-defined configuration: anchors in
/// the overlapping band stay positive. An empty ground-truth set returns all
/// anchors as negative with no positives.
///
/// # Arguments
/// * `anchors` - Anchor set (n_anchors x 4), rows `[x1, y1, x2, y2]`
/// * `gt_boxes` - Ground-truth boxes (n_gt x 4) in image coordinates
/// * `fmap_downsampled_rate` - Feature-map to image scale factor
/// * `thresholds` - Positive/negative IoU cutoffs
pub fn calc_anchor_match(
    anchors: &DMatrix<f64>,
    gt_boxes: &DMatrix<f64>,
    fmap_downsampled_rate: f64,
    thresholds: MatchThresholds,
) -> Result<AnchorMatch> {
    if anchors.ncols() != 4 {
        return Err(Error::InvalidBoxShape {
            expected: "(n_anchors, 4)".to_string(),
            got: format!("({}, {})", anchors.nrows(), anchors.ncols()),
        });
    }

    let n_anchors = anchors.nrows();
    let n_gt = gt_boxes.nrows();

    if n_gt == 0 {
        return Ok(AnchorMatch {
            positive: Vec::new(),
            negative: (0..n_anchors).collect(),
            matched_gt: DMatrix::zeros(n_anchors, 4),
        });
    }
    if gt_boxes.ncols() != 4 {
        return Err(Error::InvalidBoxShape {
            expected: "(n_gt, 4)".to_string(),
            got: format!("({}, {})", n_gt, gt_boxes.ncols()),
        });
    }
    if n_anchors == 0 {
        return Ok(AnchorMatch {
            positive: Vec::new(),
            negative: Vec::new(),
            matched_gt: DMatrix::zeros(0, 4),
        });
    }

    let gt_scaled = gt_boxes * fmap_downsampled_rate;
    let overlaps = calc_overlap(anchors, &gt_scaled);

    // Per-anchor best ground truth (row max), ties to the lowest gt index
    let mut best_iou = vec![0.0; n_anchors];
    let mut best_gt = vec![0usize; n_anchors];
    for i in 0..n_anchors {
        let mut max_iou = overlaps[(i, 0)];
        let mut max_j = 0;
        for j in 1..n_gt {
            if overlaps[(i, j)] > max_iou {
                max_iou = overlaps[(i, j)];
                max_j = j;
            }
        }
        best_iou[i] = max_iou;
        best_gt[i] = max_j;
    }

    // Forced positives: the best anchor per ground-truth box. The
    // strictly-greater scan keeps the lowest anchor index on ties.
    let mut is_positive = vec![false; n_anchors];
    for j in 0..n_gt {
        let mut max_iou = overlaps[(0, j)];
        let mut max_i = 0;
        for i in 1..n_anchors {
            if overlaps[(i, j)] > max_iou {
                max_iou = overlaps[(i, j)];
                max_i = i;
            }
        }
        is_positive[max_i] = true;
    }

    for i in 0..n_anchors {
        if best_iou[i] > thresholds.hi {
            is_positive[i] = true;
        }
    }

    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for i in 0..n_anchors {
        if is_positive[i] {
            positive.push(i);
        } else if best_iou[i] < thresholds.lo {
            negative.push(i);
        }
    }

    let mut matched_gt = DMatrix::zeros(n_anchors, 4);
    for i in 0..n_anchors {
        for c in 0..4 {
            matched_gt[(i, c)] = gt_scaled[(best_gt[i], c)];
        }
    }

    Ok(AnchorMatch {
        positive,
        negative,
        matched_gt,
    })
}
