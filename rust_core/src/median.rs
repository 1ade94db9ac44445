//! Implied median from an alternate-totals ladder.
//!
//! Each alternate line is devigged into a P(over); the median run total is
//! where that probability crosses one half. Interpolation is linear between
//! the two quoted lines that bracket the crossing.

use crate::odds::devig_prices;
use serde::{Deserialize, Serialize};

/// One rung of an alternate-totals ladder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltLine {
    pub point: f64,
    pub over_price: Option<f64>,
    pub under_price: Option<f64>,
}

impl AltLine {
    pub fn new(point: f64, over_price: f64, under_price: f64) -> Self {
        Self {
            point,
            over_price: Some(over_price),
            under_price: Some(under_price),
        }
    }
}

/// Linear interpolation of y at x between (x0, y0) and (x1, y1).
///
/// `None` when the two x coordinates coincide.
pub fn lin_interp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> Option<f64> {
    if x1 == x0 {
        return None;
    }
    Some(y0 + (y1 - y0) * ((x - x0) / (x1 - x0)))
}

/// Run total at which the market's devigged P(over) crosses 0.5.
///
/// Assumes P(over) is monotonic in the point; a noisy ladder with no
/// bracketing pair yields `None`, as does a ladder with fewer than two
/// usable rungs.
pub fn implied_median(lines: &[AltLine]) -> Option<f64> {
    if lines.len() < 2 {
        return None;
    }

    let mut pts: Vec<(f64, f64)> = lines
        .iter()
        .filter_map(|l| devig_prices(l.over_price, l.under_price).map(|dv| (l.point, dv.p_over)))
        .collect();
    pts.sort_by(|a, b| a.0.total_cmp(&b.0));

    for pair in pts.windows(2) {
        let (p0, y0) = pair[0];
        let (p1, y1) = pair[1];
        if y0 == 0.5 {
            return Some(p0);
        }
        if y1 == 0.5 {
            return Some(p1);
        }
        if (y0 - 0.5) * (y1 - 0.5) < 0.0 {
            return lin_interp(0.5, y0, y1, p0, p1);
        }
    }
    None
}
