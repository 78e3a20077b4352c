//! 群体 profile 聚合.
//!
//! 聚合保存一群细胞核的等长 profile (每个细胞核一行), 并逐点计算分位数.

use crate::consts::quartile;
use crate::error::{ProfileError, ProfileResult};
use crate::profile::Profile;
use log::warn;
use ndarray::{Array1, Array2, ArrayView1};
use ordered_float::NotNan;

/// 分位数估计: `pos = q (n + 1) / 100`.
///
/// `pos < 1` 取最小值, `pos >= n` 取最大值, 否则在第 `⌊pos⌋` 与第 `⌊pos⌋ + 1` 个
/// 顺序统计量之间线性插值. 含 NaN 或为空时返回 `None`.
pub(crate) fn percentile<I>(values: I, q: f64) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sorted = values
        .into_iter()
        .map(|v| NotNan::new(v).ok())
        .collect::<Option<Vec<_>>>()?;
    sorted.sort_unstable();

    let n = sorted.len();
    let (first, last) = (sorted.first()?.into_inner(), sorted.last()?.into_inner());
    if n == 1 {
        return Some(first);
    }
    let pos = q * (n + 1) as f64 / 100.0;
    if pos < 1.0 {
        return Some(first);
    }
    if pos >= n as f64 {
        return Some(last);
    }
    let floor = pos.floor();
    let lower = sorted[floor as usize - 1].into_inner();
    let upper = sorted[floor as usize].into_inner();
    Some(lower + (pos - floor) * (upper - lower))
}

fn column_percentile(column: ArrayView1<'_, f64>, q: f64) -> Option<f64> {
    percentile(column.iter().copied(), q).filter(|v| v.is_finite())
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        fn column_percentiles(data: &Array2<f64>, q: f64) -> Option<Vec<f64>> {
            use rayon::prelude::*;
            (0..data.ncols())
                .into_par_iter()
                .map(|i| column_percentile(data.column(i), q))
                .collect()
        }
    } else {
        fn column_percentiles(data: &Array2<f64>, q: f64) -> Option<Vec<f64>> {
            data.columns()
                .into_iter()
                .map(|column| column_percentile(column, q))
                .collect()
        }
    }
}

/// 等长 profile 的集合, 每个细胞核一行.
#[derive(Clone, Debug)]
pub struct ProfileAggregate {
    data: Array2<f64>,
}

impl ProfileAggregate {
    /// 新建空的聚合, 之后加入的 profile 长度必须都是 `common_len`.
    pub fn new(common_len: usize) -> ProfileResult<Self> {
        if common_len == 0 {
            return Err(ProfileError::invalid("aggregate length cannot be zero"));
        }
        Ok(Self {
            data: Array2::zeros((0, common_len)),
        })
    }

    /// 每个 profile 的长度.
    #[inline]
    pub fn common_len(&self) -> usize {
        self.data.ncols()
    }

    /// 已加入的 profile 个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// 是否还没有加入任何 profile?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 加入一个 profile. 长度必须等于 `common_len`.
    pub fn add_values(&mut self, profile: &Profile) -> ProfileResult<()> {
        let mismatch = ProfileError::LengthMismatch {
            expected: self.common_len(),
            found: profile.len(),
        };
        if profile.len() != self.common_len() {
            return Err(mismatch);
        }
        self.data.push_row(profile.view()).map_err(|_| mismatch)
    }

    /// 逐点第 `q` 百分位数 (`q ∈ [0, 100]`).
    ///
    /// 如果某个位置含有非有限值, 无法得到分位数, 此时退化为全 0 profile 并记录警告.
    pub fn quartile(&self, q: f64) -> ProfileResult<Profile> {
        if !quartile::is_valid(q) {
            return Err(ProfileError::invalid(format!(
                "quartile must be within [0, 100], got {q}"
            )));
        }
        if self.is_empty() {
            return Err(ProfileError::EmptyAggregate);
        }
        match column_percentiles(&self.data, q) {
            Some(values) => Ok(Profile::from_array_unchecked(Array1::from_vec(values))),
            None => {
                warn!(
                    "cannot compute quartile {q} over {} profiles of length {}: non-finite values, using zeros",
                    self.len(),
                    self.common_len()
                );
                Profile::constant(0.0, self.common_len())
            }
        }
    }

    /// 逐点中位数.
    #[inline]
    pub fn median(&self) -> ProfileResult<Profile> {
        self.quartile(quartile::MEDIAN)
    }

    /// 环上 `position` 百分比 (`[0, 100]`) 处, 最近索引上所有细胞核的值.
    pub fn values_at_position(&self, position: f64) -> ProfileResult<Vec<f64>> {
        if !(0.0..=100.0).contains(&position) {
            return Err(ProfileError::invalid(format!(
                "position must be within [0, 100], got {position}"
            )));
        }
        let len = self.common_len();
        let index = (position / 100.0 * len as f64).round() as usize % len;
        Ok(self.data.column(index).to_vec())
    }
}
