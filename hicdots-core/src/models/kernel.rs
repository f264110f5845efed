use std::fmt::{self, Display};
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::errors::{DotsError, Result};

///
/// The four HiCCUPS footprints used to estimate local background.
///
/// The declaration order is also the column order of every per-kernel output.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    Donut,
    Vertical,
    Horizontal,
    Lowleft,
}

impl KernelKind {
    pub const ALL: [KernelKind; 4] = [
        KernelKind::Donut,
        KernelKind::Vertical,
        KernelKind::Horizontal,
        KernelKind::Lowleft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KernelKind::Donut => "donut",
            KernelKind::Vertical => "vertical",
            KernelKind::Horizontal => "horizontal",
            KernelKind::Lowleft => "lowleft",
        }
    }
}

impl Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for KernelKind {
    type Err = DotsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "donut" => Ok(KernelKind::Donut),
            "vertical" => Ok(KernelKind::Vertical),
            "horizontal" => Ok(KernelKind::Horizontal),
            "lowleft" => Ok(KernelKind::Lowleft),
            _ => Err(DotsError::InvalidParameter(format!("unknown kernel: {}", s))),
        }
    }
}

///
/// A square weight footprint of side `2 * half_width + 1`.
///
/// `weights[[half_width + dy, half_width + dx]]` applies to the neighbour `dy` rows below
/// and `dx` columns to the right of the scored pixel.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    pub kind: KernelKind,
    pub half_width: usize,
    pub pad: usize,
    weights: Array2<f64>,
    footprint: Vec<(isize, isize, f64)>,
}

impl Kernel {
    ///
    /// Wrap an externally provided footprint.
    ///
    /// # Arguments
    /// - kind: which kernel the footprint stands for
    /// - weights: square array with an odd side
    /// - pad: exclusion pad the footprint was built with
    pub fn from_weights(kind: KernelKind, weights: Array2<f64>, pad: usize) -> Result<Self> {
        let (rows, cols) = weights.dim();
        if rows != cols || rows % 2 == 0 {
            return Err(DotsError::InvalidParameter(format!(
                "kernel `{}` must be square with an odd side, got {}x{}",
                kind, rows, cols
            )));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(DotsError::InvalidParameter(format!(
                "kernel `{}` contains non-finite weights",
                kind
            )));
        }

        let half_width = rows / 2;
        let footprint = weights
            .indexed_iter()
            .filter(|(_, w)| **w != 0.0)
            .map(|((r, c), w)| {
                (
                    r as isize - half_width as isize,
                    c as isize - half_width as isize,
                    *w,
                )
            })
            .collect();

        Ok(Kernel {
            kind,
            half_width,
            pad,
            weights,
            footprint,
        })
    }

    ///
    /// Build the HiCCUPS footprint of the given kind.
    ///
    /// # Arguments
    /// - kind: kernel type
    /// - w: half-width of the footprint
    /// - p: half-width of the excluded inner square, must be smaller than `w`
    pub fn hiccups(kind: KernelKind, w: usize, p: usize) -> Result<Self> {
        if p >= w {
            return Err(DotsError::InvalidParameter(format!(
                "kernel pad ({}) must be smaller than its half-width ({})",
                p, w
            )));
        }

        let side = 2 * w + 1;
        let (w, p) = (w as isize, p as isize);
        let weights = Array2::from_shape_fn((side, side), |(r, c)| {
            let dy = r as isize - w;
            let dx = c as isize - w;
            let inner = dx.abs() <= p && dy.abs() <= p;
            let keep = match kind {
                KernelKind::Donut => !inner && dx != 0 && dy != 0,
                KernelKind::Vertical => !inner && dx.abs() <= 1,
                KernelKind::Horizontal => !inner && dy.abs() <= 1,
                KernelKind::Lowleft => !inner && dx <= 0 && dy >= 0,
            };
            if keep { 1.0 } else { 0.0 }
        });

        Kernel::from_weights(kind, weights, p as usize)
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Non-zero cells as `(dy, dx, weight)` offsets from the scored pixel.
    pub fn footprint(&self) -> &[(isize, isize, f64)] {
        &self.footprint
    }
}

///
/// Build all four HiCCUPS kernels for the given `(w, p)`.
///
pub fn hiccups_kernels(w: usize, p: usize) -> Result<Vec<Kernel>> {
    KernelKind::ALL
        .iter()
        .map(|kind| Kernel::hiccups(*kind, w, p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_donut_footprint() {
        let kernel = Kernel::hiccups(KernelKind::Donut, 3, 1).unwrap();
        let weights = kernel.weights();

        assert_eq!(weights.dim(), (7, 7));
        // centre cross and inner square are masked
        assert_eq!(weights[[3, 3]], 0.0);
        assert_eq!(weights[[3, 0]], 0.0);
        assert_eq!(weights[[0, 3]], 0.0);
        assert_eq!(weights[[2, 2]], 0.0);
        assert_eq!(weights[[0, 0]], 1.0);
        // 49 - 13 (cross) - 4 (inner corners off the cross)
        assert_eq!(kernel.footprint().len(), 32);
    }

    #[rstest]
    fn test_lowleft_points_down_and_left() {
        let kernel = Kernel::hiccups(KernelKind::Lowleft, 3, 1).unwrap();
        assert!(kernel.footprint().iter().all(|(dy, dx, _)| *dy >= 0 && *dx <= 0));
        // the quadrant keeps its axis row and column
        assert!(kernel.footprint().iter().any(|(dy, dx, _)| (*dy, *dx) == (0, -3)));
        assert!(kernel.footprint().iter().any(|(dy, dx, _)| (*dy, *dx) == (3, 0)));
        // 4x4 quadrant minus the 2x2 inner cells
        assert_eq!(kernel.footprint().len(), 12);
    }

    #[rstest]
    #[case(KernelKind::Vertical)]
    #[case(KernelKind::Horizontal)]
    fn test_strip_kernels(#[case] kind: KernelKind) {
        let kernel = Kernel::hiccups(kind, 5, 2).unwrap();
        // 3 x 11 strip minus 3 x 5 of the inner square
        assert_eq!(kernel.footprint().len(), 33 - 15);
        for (dy, dx, _) in kernel.footprint() {
            match kind {
                KernelKind::Vertical => assert!(dx.abs() <= 1),
                _ => assert!(dy.abs() <= 1),
            }
        }
    }

    #[rstest]
    fn test_invalid_kernels() {
        assert!(Kernel::hiccups(KernelKind::Donut, 2, 2).is_err());
        let even = Array2::<f64>::ones((4, 4));
        assert!(Kernel::from_weights(KernelKind::Donut, even, 0).is_err());
    }

    #[rstest]
    fn test_kind_round_trip() {
        for kind in KernelKind::ALL {
            assert_eq!(kind.as_str().parse::<KernelKind>().unwrap(), kind);
        }
        assert!("upright".parse::<KernelKind>().is_err());
    }
}
