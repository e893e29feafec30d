//! Lagrangian interpolation of tabulated orbits

/// Selects the window of `order + 1` nodes, out of `len`, centered on node `nearest`.
/// The window is shifted (not shrunk) when reaching either end of the series.
/// Returns None when the series is too short.
pub(crate) fn window(nearest: usize, len: usize, order: usize) -> Option<std::ops::Range<usize>> {
    let size = order + 1;
    if len < size || nearest >= len {
        return None;
    }
    let start = nearest.saturating_sub(order / 2).min(len - size);
    Some(start..start + size)
}

/// Evaluates the Lagrange polynomial defined by `nodes` at `x`, for all N channels at once.
/// `nodes` abscissas must be distinct.
pub(crate) fn lagrange<const N: usize>(nodes: &[(f64, [f64; N])], x: f64) -> [f64; N] {
    let mut result = [0.0_f64; N];
    for (i, (x_i, y_i)) in nodes.iter().enumerate() {
        let mut li = 1.0_f64;
        for (j, (x_j, _)) in nodes.iter().enumerate() {
            if j != i {
                li *= (x - x_j) / (x_i - x_j);
            }
        }
        for (channel, y) in y_i.iter().enumerate() {
            result[channel] += li * y;
        }
    }
    result
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn windows() {
        // centered
        assert_eq!(window(10, 96, 8), Some(6..15));
        assert_eq!(window(10, 96, 9), Some(6..16));
        // clamped
        assert_eq!(window(0, 96, 8), Some(0..9));
        assert_eq!(window(2, 96, 8), Some(0..9));
        assert_eq!(window(95, 96, 8), Some(87..96));
        assert_eq!(window(93, 96, 9), Some(86..96));
        // not enough data
        assert_eq!(window(0, 5, 8), None);
        assert_eq!(window(6, 5, 3), None);
    }

    #[test]
    fn polynomial_exactness() {
        // degree 5 and lower polynomials sampled every 900s
        let p = |t: f64| {
            let t = t / 900.0;
            [
                1.0 + 2.0 * t - 0.5 * t.powi(2) + 0.01 * t.powi(5),
                -3.0 * t.powi(3) + t.powi(4),
                42.0,
                -7.0 + 0.25 * t,
            ]
        };
        let nodes: Vec<(f64, [f64; 4])> = (0..6)
            .map(|i| {
                let t = i as f64 * 900.0;
                (t, p(t))
            })
            .collect();
        for x in [100.0, 1234.5, 2700.0, 4000.0] {
            let interpolated = lagrange(&nodes, x);
            let expected = p(x);
            for channel in 0..4 {
                assert!(
                    (interpolated[channel] - expected[channel]).abs() < 1.0E-9,
                    "channel {} @ {}: {} / {}",
                    channel,
                    x,
                    interpolated[channel],
                    expected[channel]
                );
            }
        }
    }

    #[test]
    fn node_values() {
        let nodes = [(0.0, [1.0]), (1.0, [5.0]), (2.0, [-3.0])];
        assert_eq!(lagrange(&nodes, 1.0), [5.0]);
        assert_eq!(lagrange(&nodes, 0.0), [1.0]);
    }
}
