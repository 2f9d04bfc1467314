//! # Anchor target assignment
//!
//! Rust port of the anchor/target utilities used by a region-proposal
//! detection trainer: dense anchor generation over a feature map, pairwise
//! IoU between box sets, positive/negative anchor labeling against ground
//! truth, and regression-target (delta) encoding.
//!
//! All box sets are `nalgebra::DMatrix<f64>` with one box per row in
//! `[x1, y1, x2, y2]` corner order.
//!
//! ## Example
//!
//! ```rust,ignore
//! use anchor_targets_rs::{
//!     generate_anchors, calc_anchor_match, calc_delta,
//!     AnchorConfig, MatchThresholds,
//! };
//! use nalgebra::DMatrix;
//!
//! // One 4x4 anchor per cell of a 4x4 feature map
//! let config = AnchorConfig::new((4, 4), 1.0, vec![4.0], vec![1.0]);
//! let anchors = generate_anchors(&config);
//!
//! // Match against ground truth and encode targets for the positives
//! let gt = DMatrix::from_row_slice(1, 4, &[0.0, 0.0, 4.0, 4.0]);
//! let matched = calc_anchor_match(&anchors, &gt, 1.0, MatchThresholds::default())?;
//! let deltas = calc_delta(&anchors, &matched.matched_gt, [0.1, 0.1, 0.2, 0.2])?;
//! ```

pub mod anchor;
pub mod delta;
pub mod matching;
pub mod overlap;

// Re-exports for convenience
pub use anchor::{generate_anchors, AnchorConfig};
pub use delta::{apply_delta, calc_delta};
pub use matching::{calc_anchor_match, AnchorMatch, MatchThresholds};
pub use overlap::{calc_overlap, calc_overlap_parallel, calc_overlap_serial};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in the anchor-target library
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid box set shape: expected {expected}, got {got}")]
        InvalidBoxShape { expected: String, got: String },

        #[error("Degenerate box: {0}")]
        DegenerateBox(String),
    }

    /// Result type for anchor-target operations
    pub type Result<T> = std::result::Result<T, Error>;
}
