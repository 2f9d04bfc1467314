//! Serial overlap computation, the reference path.

use nalgebra::DMatrix;

use super::iou_pair;

/// Compute the IoU matrix on the current thread.
pub fn calc_overlap_serial(query_boxes: &DMatrix<f64>, ref_boxes: &DMatrix<f64>) -> DMatrix<f64> {
    assert!(
        query_boxes.ncols() >= 4,
        "overlap requires at least 4 columns (x1, y1, x2, y2), got {}",
        query_boxes.ncols()
    );
    assert!(
        ref_boxes.ncols() >= 4,
        "overlap requires at least 4 columns (x1, y1, x2, y2), got {}",
        ref_boxes.ncols()
    );

    let n_queries = query_boxes.nrows();
    let n_refs = ref_boxes.nrows();

    let mut result = DMatrix::zeros(n_queries, n_refs);
    for i in 0..n_queries {
        for j in 0..n_refs {
            result[(i, j)] = iou_pair(
                query_boxes[(i, 0)],
                query_boxes[(i, 1)],
                query_boxes[(i, 2)],
                query_boxes[(i, 3)],
                ref_boxes[(j, 0)],
                ref_boxes[(j, 1)],
                ref_boxes[(j, 2)],
                ref_boxes[(j, 3)],
            );
        }
    }

    result
}
