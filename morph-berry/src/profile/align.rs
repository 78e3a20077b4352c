//! profile 之间的差异度量与旋转对齐.

use super::{interpolate_values, Profile};
use crate::consts::STRAIGHT_ANGLE;
use itertools::izip;
use ndarray::ArrayView1;
use std::cmp::Ordering;

/// 把较短的一方插值到较长一方的长度后, 交给 `f` 逐点比较.
fn with_common_len<R>(
    a: &Profile,
    b: &Profile,
    f: impl FnOnce(ArrayView1<'_, f64>, ArrayView1<'_, f64>) -> R,
) -> R {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => f(a.view(), b.view()),
        Ordering::Greater => {
            let b = interpolate_values(b.view(), a.len());
            f(a.view(), b.view())
        }
        Ordering::Less => {
            let a = interpolate_values(a.view(), b.len());
            f(a.view(), b.view())
        }
    }
}

/// 按得分升序, 得分相同时按索引升序.
#[inline]
fn by_score(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        fn best_rotation<F>(n: usize, score: F) -> usize
        where
            F: Fn(usize) -> f64 + Sync,
        {
            use rayon::prelude::*;
            (0..n)
                .into_par_iter()
                .map(|i| (i, score(i)))
                .min_by(by_score)
                .map_or(0, |(i, _)| i)
        }
    } else {
        fn best_rotation<F>(n: usize, score: F) -> usize
        where
            F: Fn(usize) -> f64,
        {
            (0..n)
                .map(|i| (i, score(i)))
                .min_by(by_score)
                .map_or(0, |(i, _)| i)
        }
    }
}

impl Profile {
    /// 差的平方和. 长度不同时, 较短的一方先插值到较长一方的长度.
    pub fn absolute_square_difference(&self, other: &Profile) -> f64 {
        with_common_len(self, other, |a, b| {
            izip!(a.iter(), b.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum()
        })
    }

    /// 加权差的平方和. 每个差值先乘以 `|other[i] − 180| / 180` 再平方,
    /// 因此 `other` 中接近直线边界的位置几乎不参与比较.
    pub fn weighted_square_difference(&self, other: &Profile) -> f64 {
        with_common_len(self, other, |a, b| {
            izip!(a.iter(), b.iter())
                .map(|(x, y)| {
                    let weight = (y - STRAIGHT_ANGLE).abs() / STRAIGHT_ANGLE;
                    ((x - y) * weight).powi(2)
                })
                .sum()
        })
    }

    /// 在全部 `N` 个旋转 `self.offset(i)` 中, 找出与 `other` 差的平方和最小的 `i`.
    /// 有多个最小值时返回最小的 `i`.
    ///
    /// 于是 `p.sliding_window_offset(&p.offset(j)) == j`.
    pub fn sliding_window_offset(&self, other: &Profile) -> usize {
        let n = self.len();
        if other.len() > n {
            // 每个旋转都要单独插值到 other 的长度.
            return best_rotation(n, |i| {
                self.offset(i as isize).absolute_square_difference(other)
            });
        }

        let target = if other.len() == n {
            other.view().to_owned()
        } else {
            interpolate_values(other.view(), n)
        };
        let values = self.view();
        best_rotation(n, |i| {
            target
                .iter()
                .enumerate()
                .map(|(k, t)| (values[(k + i) % n] - t).powi(2))
                .sum()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{f64_eq, hexagon};
    use crate::profile::Profile;

    fn asymmetric(n: usize) -> Profile {
        Profile::new(
            (0..n)
                .map(|i| {
                    let x = i as f64 / n as f64;
                    180.0 + 40.0 * (x * std::f64::consts::TAU).sin() + 90.0 * (-((x - 0.2) / 0.05).powi(2)).exp()
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_square_difference() {
        let p = hexagon();
        assert!(f64_eq(p.absolute_square_difference(&p), 0.0));
        let q = p.add_scalar(1.0).unwrap();
        assert!(f64_eq(p.absolute_square_difference(&q), 6.0));
        // 长度不同: 先插值.
        assert!(f64_eq(p.absolute_square_difference(&p.interpolate(12).unwrap()), 0.0));
    }

    #[test]
    fn test_weighted_square_difference() {
        let straight = Profile::constant(180.0, 4).unwrap();
        let bent = Profile::constant(90.0, 4).unwrap();
        assert!(f64_eq(bent.weighted_square_difference(&straight), 0.0));
        // 权重 0.5, 差 90 -> (45)^2 * 4.
        assert!(f64_eq(straight.weighted_square_difference(&bent), 4.0 * 45.0 * 45.0));
    }

    #[test]
    fn test_sliding_window_offset() {
        let p = asymmetric(50);
        for j in [0, 1, 7, 25, 49] {
            assert_eq!(p.sliding_window_offset(&p.offset(j)), j as usize);
            assert_eq!(p.offset(j).sliding_window_offset(&p), (50 - j as usize) % 50);
        }
    }

    #[test]
    fn test_sliding_window_offset_hexagon() {
        let p = hexagon();
        assert_eq!(p.sliding_window_offset(&p.offset(2)), 2);
        // 对称 profile: 并列时取最小的旋转.
        let flat = Profile::constant(1.0, 5).unwrap();
        assert_eq!(flat.sliding_window_offset(&flat), 0);
    }

    #[test]
    fn test_sliding_window_offset_mixed_len() {
        let p = asymmetric(40);
        let long = p.offset(10).interpolate(80).unwrap();
        assert_eq!(p.sliding_window_offset(&long), 10);
        let short = p.interpolate(80).unwrap();
        assert_eq!(short.sliding_window_offset(&p.offset(5)), 10);
    }
}
