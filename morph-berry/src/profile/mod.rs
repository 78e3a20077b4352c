//! 环形 profile.
//!
//! profile 是定长且首尾相接的实数序列, 一般是细胞核轮廓上某种测量值
//! (如边界转角) 关于弧长位置的函数. 索引 `i` 与 `i mod N` 指向同一个边界位置.
//!
//! profile 是值对象: 所有变换 (旋转, 平滑, 差分, 重采样, 算术) 都返回新的
//! profile, 从不原地修改.

mod align;
mod boolean;
mod resample;
mod window;

pub use boolean::BooleanProfile;

pub(crate) use resample::{interpolate_values, project_index};

use crate::error::{ProfileError, ProfileResult};
use itertools::izip;
use ndarray::{Array1, ArrayView1};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 定长环形实数序列. 长度至少为 1.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct Profile {
    values: Array1<f64>,
}

#[allow(clippy::len_without_is_empty)]
impl Profile {
    /// 从 `values` 构建 profile.
    ///
    /// 如果 `values` 为空, 返回 `Err(ProfileError::InvalidArgument)`.
    pub fn new(values: Vec<f64>) -> ProfileResult<Self> {
        Self::from_array(Array1::from_vec(values))
    }

    /// 从 `ndarray` 一维数组构建 profile.
    pub fn from_array(values: Array1<f64>) -> ProfileResult<Self> {
        if values.is_empty() {
            return Err(ProfileError::invalid("profile must hold at least one value"));
        }
        Ok(Self { values })
    }

    /// 构建每个位置都为 `value`, 长度为 `len` 的 profile.
    pub fn constant(value: f64, len: usize) -> ProfileResult<Self> {
        if len == 0 {
            return Err(ProfileError::invalid("profile length cannot be zero"));
        }
        Ok(Self {
            values: Array1::from_elem(len, value),
        })
    }

    /// 内部方法. 调用者保证 `values` 非空.
    #[inline]
    pub(crate) fn from_array_unchecked(values: Array1<f64>) -> Self {
        debug_assert!(!values.is_empty());
        Self { values }
    }

    /// profile 长度 `N`.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 获取位置 `index` 的值. 不做环形回绕: 若 `index` 不在 `[0, N)` 内,
    /// 返回 `Err(ProfileError::OutOfRange)`. 需要换一个起点时请使用 [`Profile::offset`].
    pub fn get(&self, index: usize) -> ProfileResult<f64> {
        self.values
            .get(index)
            .copied()
            .ok_or(ProfileError::OutOfRange {
                index,
                len: self.len(),
            })
    }

    /// 底层数据的只读视图.
    #[inline]
    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    /// 按索引顺序迭代所有值.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// 复制出全部值.
    #[inline]
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }

    /// 把任意整数索引折回 `[0, N)`.
    #[inline]
    pub(crate) fn wrap(&self, index: isize) -> usize {
        wrap_index(index, self.len())
    }

    /// 环形访问.
    #[inline]
    pub(crate) fn at(&self, index: isize) -> f64 {
        self.values[self.wrap(index)]
    }

    /// 环形旋转: 新 profile 的第 `i` 个位置保存原 profile 第 `(i + j) mod N` 个位置的值.
    ///
    /// 这是把以 Reference 为起点的 profile 改为以任意标签为起点的方式. `j` 可以为负.
    pub fn offset(&self, j: isize) -> Profile {
        let n = self.len();
        let j = self.wrap(j);
        Self::from_array_unchecked(Array1::from_shape_fn(n, |i| self.values[(i + j) % n]))
    }

    /// 逆序.
    pub fn reverse(&self) -> Profile {
        Self::from_array_unchecked(self.values.iter().rev().copied().collect())
    }

    fn zip_with(&self, other: &Profile, f: impl Fn(f64, f64) -> f64) -> ProfileResult<Profile> {
        if self.len() != other.len() {
            return Err(ProfileError::LengthMismatch {
                expected: self.len(),
                found: other.len(),
            });
        }
        Ok(Self::from_array_unchecked(
            izip!(self.values.iter(), other.values.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        ))
    }

    fn map_scalar(&self, value: f64, f: impl Fn(f64, f64) -> f64) -> ProfileResult<Profile> {
        if !value.is_finite() {
            return Err(ProfileError::invalid(format!(
                "scalar operand must be finite, got {value}"
            )));
        }
        Ok(Self::from_array_unchecked(self.values.mapv(|v| f(v, value))))
    }

    /// 逐点相加. 两者长度必须一致.
    pub fn add(&self, other: &Profile) -> ProfileResult<Profile> {
        self.zip_with(other, |a, b| a + b)
    }

    /// 逐点相减. 两者长度必须一致.
    pub fn subtract(&self, other: &Profile) -> ProfileResult<Profile> {
        self.zip_with(other, |a, b| a - b)
    }

    /// 逐点相乘. 两者长度必须一致.
    pub fn multiply(&self, other: &Profile) -> ProfileResult<Profile> {
        self.zip_with(other, |a, b| a * b)
    }

    /// 逐点相除. 两者长度必须一致.
    pub fn divide(&self, other: &Profile) -> ProfileResult<Profile> {
        self.zip_with(other, |a, b| a / b)
    }

    /// 每个位置加上 `value`. `value` 必须是有限值.
    pub fn add_scalar(&self, value: f64) -> ProfileResult<Profile> {
        self.map_scalar(value, |v, s| v + s)
    }

    /// 每个位置减去 `value`. `value` 必须是有限值.
    pub fn subtract_scalar(&self, value: f64) -> ProfileResult<Profile> {
        self.map_scalar(value, |v, s| v - s)
    }

    /// 每个位置乘以 `value`. `value` 必须是有限值.
    pub fn multiply_scalar(&self, value: f64) -> ProfileResult<Profile> {
        self.map_scalar(value, |v, s| v * s)
    }

    /// 每个位置除以 `value`. `value` 必须是有限值.
    pub fn divide_scalar(&self, value: f64) -> ProfileResult<Profile> {
        self.map_scalar(value, |v, s| v / s)
    }

    /// 逐点取绝对值.
    pub fn absolute(&self) -> Profile {
        Self::from_array_unchecked(self.values.mapv(f64::abs))
    }

    /// 逐点求 `exponent` 次幂.
    pub fn power(&self, exponent: f64) -> Profile {
        Self::from_array_unchecked(self.values.mapv(|v| v.powf(exponent)))
    }

    /// 前缀和.
    pub fn cumulative_sum(&self) -> Profile {
        let mut acc = 0.0;
        Self::from_array_unchecked(self.values.mapv(|v| {
            acc += v;
            acc
        }))
    }

    /// 最大值.
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// 最小值.
    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// 最大值第一次出现的索引.
    pub fn index_of_max(&self) -> usize {
        first_best(self.values.iter().copied().enumerate(), |cand, best| {
            cand > best
        })
        .unwrap_or(0)
    }

    /// 最小值第一次出现的索引.
    pub fn index_of_min(&self) -> usize {
        first_best(self.values.iter().copied().enumerate(), |cand, best| {
            cand < best
        })
        .unwrap_or(0)
    }

    /// 只考虑 `limits` 中为 `true` 的位置, 求最大值第一次出现的索引.
    ///
    /// 如果没有可选位置, 返回 `Ok(None)`.
    pub fn index_of_max_within(&self, limits: &BooleanProfile) -> ProfileResult<Option<usize>> {
        self.check_limits(limits)?;
        Ok(first_best(self.masked(limits), |cand, best| cand > best))
    }

    /// 只考虑 `limits` 中为 `true` 的位置, 求最小值第一次出现的索引.
    pub fn index_of_min_within(&self, limits: &BooleanProfile) -> ProfileResult<Option<usize>> {
        self.check_limits(limits)?;
        Ok(first_best(self.masked(limits), |cand, best| cand < best))
    }

    fn check_limits(&self, limits: &BooleanProfile) -> ProfileResult<()> {
        if limits.len() != self.len() {
            return Err(ProfileError::LengthMismatch {
                expected: self.len(),
                found: limits.len(),
            });
        }
        Ok(())
    }

    fn masked<'a>(&'a self, limits: &'a BooleanProfile) -> impl Iterator<Item = (usize, f64)> + 'a {
        limits.indices().map(move |i| (i, self.values[i]))
    }

    /// 弧长比例 `fraction` (`[0, 1]`) 对应的索引.
    pub fn index_of_fraction(&self, fraction: f64) -> ProfileResult<usize> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ProfileError::invalid(format!(
                "fraction must be within [0, 1], got {fraction}"
            )));
        }
        let index = (self.len() as f64 * fraction) as usize;
        Ok(index.min(self.len() - 1))
    }

    /// 索引 `index` 对应的弧长比例.
    pub fn fraction_of_index(&self, index: usize) -> ProfileResult<f64> {
        if index >= self.len() {
            return Err(ProfileError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(index as f64 / self.len() as f64)
    }

    /// 以 `index` 为中心, 前后各 `window` 个值 (环形) 组成的新 profile, 长度 `2 * window + 1`.
    pub fn window(&self, index: usize, window: usize) -> ProfileResult<Profile> {
        if index >= self.len() {
            return Err(ProfileError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        let center = index as isize;
        let w = window as isize;
        Ok(Self::from_array_unchecked(
            (-w..=w).map(|k| self.at(center + k)).collect(),
        ))
    }

    /// 闭区间 `[start, end]` 上的值. 当 `end < start` 时跨过索引 0.
    pub fn subregion(&self, start: usize, end: usize) -> ProfileResult<Profile> {
        let n = self.len();
        for index in [start, end] {
            if index >= n {
                return Err(ProfileError::OutOfRange { index, len: n });
            }
        }
        let values: Array1<f64> = if start <= end {
            self.values.iter().skip(start).take(end - start + 1).copied().collect()
        } else {
            self.values
                .iter()
                .skip(start)
                .chain(self.values.iter().take(end + 1))
                .copied()
                .collect()
        };
        Ok(Self::from_array_unchecked(values))
    }

    /// 线性缩放到 `[min, max]`.
    ///
    /// 所有值都相等时, 结果的每个位置都是 `min`.
    pub fn normalise_amplitude(&self, min: f64, max: f64) -> ProfileResult<Profile> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ProfileError::invalid(format!(
                "amplitude range [{min}, {max}] is not a finite increasing range"
            )));
        }
        let (old_min, old_max) = (self.min(), self.max());
        let old_range = old_max - old_min;
        let range = max - min;
        Ok(Self::from_array_unchecked(self.values.mapv(|v| {
            if old_range == 0.0 {
                min
            } else {
                (v - old_min) / old_range * range + min
            }
        })))
    }
}

/// 把任意整数索引折回 `[0, len)`. `len` 必须非零.
#[inline]
pub(crate) fn wrap_index(index: isize, len: usize) -> usize {
    debug_assert_ne!(len, 0);
    index.rem_euclid(len as isize) as usize
}

/// 遍历 `(index, value)`, 找出第一个 "最优" 值的索引.
fn first_best<I, F>(it: I, better: F) -> Option<usize>
where
    I: Iterator<Item = (usize, f64)>,
    F: Fn(f64, f64) -> bool,
{
    it.fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
        Some((_, bv)) if !better(v, bv) => best,
        _ => Some((i, v)),
    })
    .map(|(i, _)| i)
}

impl TryFrom<Vec<f64>> for Profile {
    type Error = ProfileError;

    #[inline]
    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Profile> for Vec<f64> {
    #[inline]
    fn from(value: Profile) -> Self {
        value.values.to_vec()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::Profile;
    use crate::error::ProfileError;

    pub(crate) fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    pub(crate) fn assert_profile_eq(a: &Profile, b: &Profile) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!(f64_eq(x, y), "{a:?} != {b:?}");
        }
    }

    pub(crate) fn hexagon() -> Profile {
        Profile::new(vec![0.0, 10.0, 20.0, 30.0, 20.0, 10.0]).unwrap()
    }

    #[test]
    fn test_profile_init_err() {
        assert!(matches!(
            Profile::new(vec![]),
            Err(ProfileError::InvalidArgument(_))
        ));
        assert!(Profile::constant(1.0, 0).is_err());
        assert_eq!(Profile::constant(2.5, 4).unwrap().to_vec(), vec![2.5; 4]);
    }

    #[test]
    fn test_profile_get_no_wrap() {
        let p = hexagon();
        assert_eq!(p.get(3), Ok(30.0));
        assert_eq!(p.get(6), Err(ProfileError::OutOfRange { index: 6, len: 6 }));
    }

    #[test]
    fn test_profile_offset() {
        let p = hexagon();
        assert_eq!(p.offset(2).to_vec(), vec![20.0, 30.0, 20.0, 10.0, 0.0, 10.0]);
        assert_eq!(p.offset(-1).to_vec(), vec![10.0, 0.0, 10.0, 20.0, 30.0, 20.0]);
        assert_eq!(p.offset(6), p);
        assert_eq!(p.offset(0), p);
    }

    #[test]
    fn test_profile_offset_circularity() {
        let p = Profile::new((0..17).map(|i| (i as f64 * 0.7).sin()).collect()).unwrap();
        for j in -40..40 {
            assert_profile_eq(&p.offset(j).offset(-j), &p);
        }
    }

    #[test]
    fn test_profile_arithmetic() {
        let p = hexagon();
        let q = Profile::constant(1.0, 6).unwrap();
        assert_eq!(p.add(&q).unwrap().get(0), Ok(1.0));
        assert_eq!(p.subtract(&q).unwrap().get(3), Ok(29.0));
        assert_eq!(p.multiply_scalar(0.5).unwrap().get(3), Ok(15.0));
        assert!(p.add_scalar(f64::NAN).is_err());
        assert_eq!(
            p.add(&Profile::constant(1.0, 5).unwrap()),
            Err(ProfileError::LengthMismatch {
                expected: 6,
                found: 5
            })
        );
        assert_eq!(
            p.cumulative_sum().to_vec(),
            vec![0.0, 10.0, 30.0, 60.0, 80.0, 90.0]
        );
        assert_eq!(p.reverse().get(0), Ok(10.0));
    }

    #[test]
    fn test_profile_extreme_indices() {
        let p = hexagon();
        assert_eq!(p.index_of_max(), 3);
        assert_eq!(p.index_of_min(), 0);
        assert_eq!(p.max(), 30.0);
        assert_eq!(p.min(), 0.0);

        // 并列时取第一个.
        let q = Profile::new(vec![1.0, 5.0, 5.0, 0.0, 0.0]).unwrap();
        assert_eq!(q.index_of_max(), 1);
        assert_eq!(q.index_of_min(), 3);
    }

    #[test]
    fn test_profile_window_and_subregion() {
        let p = hexagon();
        assert_eq!(p.window(0, 1).unwrap().to_vec(), vec![10.0, 0.0, 10.0]);
        assert_eq!(p.subregion(1, 3).unwrap().to_vec(), vec![10.0, 20.0, 30.0]);
        assert_eq!(p.subregion(4, 1).unwrap().to_vec(), vec![20.0, 10.0, 0.0, 10.0]);
        assert!(p.subregion(0, 6).is_err());
    }

    #[test]
    fn test_profile_fraction() {
        let p = hexagon();
        assert_eq!(p.index_of_fraction(0.5), Ok(3));
        assert_eq!(p.index_of_fraction(1.0), Ok(5));
        assert!(p.index_of_fraction(1.5).is_err());
        assert!(f64_eq(p.fraction_of_index(3).unwrap(), 0.5));
    }

    #[test]
    fn test_profile_normalise_amplitude() {
        let p = hexagon().normalise_amplitude(0.0, 1.0).unwrap();
        assert!(f64_eq(p.max(), 1.0));
        assert!(f64_eq(p.min(), 0.0));
        assert!(f64_eq(p.get(1).unwrap(), 1.0 / 3.0));
        assert!(hexagon().normalise_amplitude(1.0, 1.0).is_err());
    }
}
