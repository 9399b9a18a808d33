// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Size sweep generation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::Size;

/// Default first size of a geometric sweep.
pub const GEOMETRIC_START: u64 = 512;
/// Default number of sizes in a geometric sweep (512 .. 512 * 2^21).
pub const GEOMETRIC_COUNT: u32 = 22;

/// One measurement run in a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPoint {
    pub size: Size,
    /// Zero-based repetition index of this size.
    pub iteration: u32,
}

/// The ordered sequence of sizes a run drives the measurement program through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SweepPlan {
    /// `count` sizes starting at `start`, doubling each step.
    Geometric { start: Size, count: u32 },
    /// Each size in order, repeated `iterations` times before moving on.
    Fixed { sizes: Vec<Size>, iterations: u32 },
}

impl SweepPlan {
    /// 512, 1024, ... 22 sizes.
    pub fn geometric_default() -> Self {
        SweepPlan::Geometric {
            start: Size::new(GEOMETRIC_START).expect("GEOMETRIC_START is non-zero"),
            count: GEOMETRIC_COUNT,
        }
    }

    /// Check the plan produces at least one point and no size overflows.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            SweepPlan::Geometric { start, count } => {
                if *count == 0 {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "sweep.count",
                        value: "0".to_string(),
                        reason: "Geometric sweep needs at least one size".to_string(),
                    });
                }
                let fits = 1u64
                    .checked_shl(count - 1)
                    .and_then(|factor| start.get().checked_mul(factor))
                    .is_some();
                if !fits {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "sweep.count",
                        value: count.to_string(),
                        reason: format!("Doubling {} that many times overflows u64", start),
                    });
                }
            }
            SweepPlan::Fixed { sizes, iterations } => {
                if sizes.is_empty() {
                    return Err(ValidationError::MissingRequiredField {
                        field: "sweep.sizes",
                        context: "fixed sweep".to_string(),
                    });
                }
                if *iterations == 0 {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "sweep.iterations",
                        value: "0".to_string(),
                        reason: "Each size must run at least once".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Total number of measurement runs.
    pub fn len(&self) -> usize {
        match self {
            SweepPlan::Geometric { count, .. } => *count as usize,
            SweepPlan::Fixed { sizes, iterations } => sizes.len() * *iterations as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand the plan into its ordered points.
    ///
    /// Geometric sizes that would overflow are cut off; [`SweepPlan::validate`]
    /// rejects such plans up front.
    pub fn points(&self) -> Vec<SweepPoint> {
        match self {
            SweepPlan::Geometric { start, count } => {
                std::iter::successors(Some(*start), |size| {
                    size.get().checked_mul(2).and_then(|s| Size::new(s).ok())
                })
                .take(*count as usize)
                .map(|size| SweepPoint { size, iteration: 0 })
                .collect()
            }
            SweepPlan::Fixed { sizes, iterations } => sizes
                .iter()
                .flat_map(|&size| (0..*iterations).map(move |iteration| SweepPoint { size, iteration }))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(values: &[u64]) -> Vec<Size> {
        values.iter().map(|&v| Size::new(v).unwrap()).collect()
    }

    #[test]
    fn test_geometric_default() {
        let points = SweepPlan::geometric_default().points();
        assert_eq!(points.len(), 22);
        assert_eq!(points[0].size.get(), 512);
        assert_eq!(points[1].size.get(), 1024);
        assert_eq!(points[21].size.get(), 512 << 21);
        assert!(points.iter().all(|p| p.iteration == 0));
    }

    #[test]
    fn test_fixed_repeats_each_size() {
        let plan = SweepPlan::Fixed {
            sizes: sizes(&[32, 64]),
            iterations: 3,
        };
        let points: Vec<_> = plan
            .points()
            .into_iter()
            .map(|p| (p.size.get(), p.iteration))
            .collect();

        assert_eq!(plan.len(), 6);
        assert_eq!(
            points,
            vec![(32, 0), (32, 1), (32, 2), (64, 0), (64, 1), (64, 2)]
        );
    }

    #[test]
    fn test_validate_rejects_empty_plans() {
        let empty = SweepPlan::Fixed {
            sizes: vec![],
            iterations: 10,
        };
        assert!(empty.validate().is_err());

        let no_iterations = SweepPlan::Fixed {
            sizes: sizes(&[32]),
            iterations: 0,
        };
        assert!(no_iterations.validate().is_err());

        let no_count = SweepPlan::Geometric {
            start: Size::new(512).unwrap(),
            count: 0,
        };
        assert!(no_count.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overflow() {
        let plan = SweepPlan::Geometric {
            start: Size::new(512).unwrap(),
            count: 60,
        };
        assert!(plan.validate().is_err());
        assert!(SweepPlan::geometric_default().validate().is_ok());
    }

    #[test]
    fn test_plan_from_yaml() {
        let plan: SweepPlan = serde_yaml::from_str(
            r#"
kind: fixed
sizes: [32, 64, 128]
iterations: 10
"#,
        )
        .unwrap();
        assert_eq!(plan.len(), 30);
    }
}
