//! Pairwise IoU between two box sets.
//!
//! `calc_overlap` dispatches to a rayon-parallel path when a multi-threaded
//! pool is available and to a serial path otherwise. The capability check
//! runs once; both paths share the same per-pair kernel, so their outputs
//! are identical. The individual paths are also exported for callers that
//! want to pin a backend.

mod parallel;
mod serial;

pub use parallel::calc_overlap_parallel;
pub use serial::calc_overlap_serial;

use std::sync::OnceLock;

use nalgebra::DMatrix;

static PARALLEL_AVAILABLE: OnceLock<bool> = OnceLock::new();

fn parallel_available() -> bool {
    *PARALLEL_AVAILABLE.get_or_init(|| {
        let threads = rayon::current_num_threads();
        if threads <= 1 {
            log::debug!(
                "parallel overlap backend unavailable ({} worker thread), using serial path",
                threads
            );
        }
        threads > 1
    })
}

/// Compute the IoU matrix between two box sets.
///
/// # Arguments
/// * `query_boxes` - Query boxes (n_queries x 4), rows `[x1, y1, x2, y2]`
/// * `ref_boxes` - Reference boxes (n_refs x 4), same format
///
/// # Returns
/// Matrix (n_queries x n_refs) where entry `[i, j]` is the IoU of query box
/// `i` and reference box `j`, in `[0, 1]`.
pub fn calc_overlap(query_boxes: &DMatrix<f64>, ref_boxes: &DMatrix<f64>) -> DMatrix<f64> {
    if parallel_available() {
        calc_overlap_parallel(query_boxes, ref_boxes)
    } else {
        calc_overlap_serial(query_boxes, ref_boxes)
    }
}

/// IoU of a single box pair, corners `[x1, y1, x2, y2]`.
///
/// Areas follow the pixel-inclusive convention: a box spans
/// `(x2 - x1 + 1) * (y2 - y1 + 1)` pixels. Matching thresholds are tuned
/// against this, so the `+1` must not be dropped. A non-positive union
/// (degenerate boxes on both sides) yields 0.
#[inline]
#[allow(clippy::too_many_arguments)]
pub(crate) fn iou_pair(
    q_x1: f64,
    q_y1: f64,
    q_x2: f64,
    q_y2: f64,
    r_x1: f64,
    r_y1: f64,
    r_x2: f64,
    r_y2: f64,
) -> f64 {
    let intersect_left = q_x1.max(r_x1);
    let intersect_top = q_y1.max(r_y1);
    let intersect_right = q_x2.min(r_x2);
    let intersect_bottom = q_y2.min(r_y2);

    let intersect_area = (intersect_right - intersect_left + 1.0).max(0.0)
        * (intersect_bottom - intersect_top + 1.0).max(0.0);

    let query_area = (q_x2 - q_x1 + 1.0) * (q_y2 - q_y1 + 1.0);
    let ref_area = (r_x2 - r_x1 + 1.0) * (r_y2 - r_y1 + 1.0);

    let union_area = query_area + ref_area - intersect_area;
    if union_area > 0.0 {
        intersect_area / union_area
    } else {
        0.0
    }
}
