//! 基于环形窗口的 profile 运算: 平滑, 差分, 局部极值, 稳定区间.
//!
//! 窗口 `w` 指中心点前后各 `w` 个位置, 窗口访问一律环形回绕.
//! 因此 `N = 1` 的 profile 也是合法输入, 此时窗口内全部是它自己.

use super::{BooleanProfile, Profile};
use crate::error::{ProfileError, ProfileResult};
use ndarray::Array1;

/// 局部极值需要至少一步的窗口.
fn check_window(window: usize) -> ProfileResult<()> {
    if window == 0 {
        return Err(ProfileError::invalid("extremum window must be positive"));
    }
    Ok(())
}

impl Profile {
    /// 长度为 `2w + 1` 的环形滑动平均. `w = 0` 时结果与原 profile 相同.
    pub fn smooth(&self, window: usize) -> ProfileResult<Profile> {
        let w = window as isize;
        let denominator = (2 * window + 1) as f64;
        Ok(Self::from_array_unchecked(Array1::from_shape_fn(
            self.len(),
            |i| {
                let i = i as isize;
                let sum: f64 = (-w..=w).map(|k| self.at(i + k)).sum();
                sum / denominator
            },
        )))
    }

    /// 每个位置前后各 `w` 步内, 相邻值的差之和.
    ///
    /// 位置 `i` 的结果是 `Σ (v[i-k+1] - v[i-k]) + (v[i+k] - v[i+k-1])`, `k = 1..=w`,
    /// 即 `v[i+w] - v[i-w]`. `w = 0` 时全为 0.
    pub fn calculate_deltas(&self, window: usize) -> ProfileResult<Profile> {
        Ok(Self::from_array_unchecked(Array1::from_shape_fn(
            self.len(),
            |i| {
                let i = i as isize;
                (1..=window as isize)
                    .map(|k| {
                        (self.at(i - k + 1) - self.at(i - k)) + (self.at(i + k) - self.at(i + k - 1))
                    })
                    .sum()
            },
        )))
    }

    /// 一阶差分: `(v[i] - v[i-1]) + (v[i+1] - v[i])`.
    pub fn differentiate(&self) -> Profile {
        Self::from_array_unchecked(Array1::from_shape_fn(self.len(), |i| {
            let i = i as isize;
            let v = self.at(i);
            (v - self.at(i - 1)) + (self.at(i + 1) - v)
        }))
    }

    /// 严格单调测试: 从 `i` 向两侧各走 `w` 步, 每一步都满足 `steps(inner, outer)`.
    fn extremum_flags(&self, window: usize, steps: impl Fn(f64, f64) -> bool) -> BooleanProfile {
        let w = window as isize;
        BooleanProfile::from_flags(
            (0..self.len() as isize)
                .map(|i| {
                    (1..=w).all(|k| {
                        steps(self.at(i - k + 1), self.at(i - k))
                            && steps(self.at(i + k - 1), self.at(i + k))
                    })
                })
                .collect(),
        )
    }

    /// 局部极小值: 两侧 `w` 步内的值严格递增.
    pub fn local_minima(&self, window: usize) -> ProfileResult<BooleanProfile> {
        check_window(window)?;
        Ok(self.extremum_flags(window, |inner, outer| outer > inner))
    }

    /// 局部极大值: 两侧 `w` 步内的值严格递减.
    pub fn local_maxima(&self, window: usize) -> ProfileResult<BooleanProfile> {
        check_window(window)?;
        Ok(self.extremum_flags(window, |inner, outer| outer < inner))
    }

    /// 值小于 `threshold` 的局部极小值.
    pub fn local_minima_below(&self, window: usize, threshold: f64) -> ProfileResult<BooleanProfile> {
        let minima = self.local_minima(window)?;
        self.refine(minima, |v| v < threshold)
    }

    /// 值大于 `threshold` 的局部极大值.
    pub fn local_maxima_above(&self, window: usize, threshold: f64) -> ProfileResult<BooleanProfile> {
        let maxima = self.local_maxima(window)?;
        self.refine(maxima, |v| v > threshold)
    }

    /// 值小于 `threshold`, 且绝对值大于 `fraction × (max − min)` 的局部极小值.
    pub fn local_minima_significant(
        &self,
        window: usize,
        threshold: f64,
        fraction: f64,
    ) -> ProfileResult<BooleanProfile> {
        let floor = self.significance_floor(fraction)?;
        let minima = self.local_minima(window)?;
        self.refine(minima, |v| v < threshold && v.abs() > floor)
    }

    /// 值大于 `threshold`, 且绝对值大于 `fraction × (max − min)` 的局部极大值.
    pub fn local_maxima_significant(
        &self,
        window: usize,
        threshold: f64,
        fraction: f64,
    ) -> ProfileResult<BooleanProfile> {
        let floor = self.significance_floor(fraction)?;
        let maxima = self.local_maxima(window)?;
        self.refine(maxima, |v| v > threshold && v.abs() > floor)
    }

    fn significance_floor(&self, fraction: f64) -> ProfileResult<f64> {
        if !fraction.is_finite() {
            return Err(ProfileError::invalid(format!(
                "fraction must be finite, got {fraction}"
            )));
        }
        Ok((self.max() - self.min()) * fraction)
    }

    fn refine(&self, flags: BooleanProfile, keep: impl Fn(f64) -> bool) -> ProfileResult<BooleanProfile> {
        let values = BooleanProfile::from_flags(self.iter().map(keep).collect());
        flags.and(&values)
    }

    /// 线性扫描 (不回绕), 查找第一段至少 `min_points` 个连续值都严格落在
    /// `(value − tolerance, value + tolerance)` 内的区间.
    ///
    /// 返回 `(start, end)`, `end` 不包含在区间内. 找不到时返回 `None`.
    /// 末尾一直延伸到 profile 结束的区间同样会被返回.
    pub fn consistent_region_bounds(
        &self,
        value: f64,
        tolerance: f64,
        min_points: usize,
    ) -> Option<(usize, usize)> {
        let (lower, upper) = (value - tolerance, value + tolerance);
        let mut start = None;
        for (index, v) in self.iter().enumerate() {
            let inside = v > lower && v < upper;
            match (inside, start) {
                (true, None) => start = Some(index),
                (false, Some(s)) => {
                    if index - s >= min_points {
                        return Some((s, index));
                    }
                    start = None;
                }
                _ => {}
            }
        }
        start
            .filter(|&s| self.len() - s >= min_points)
            .map(|s| (s, self.len()))
    }
}
