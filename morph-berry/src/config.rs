//! 分析参数.

use crate::consts::{VARIABLE_MAXIMA_WINDOW, VARIABLE_REGION_COUNT, VARIABLE_SMOOTH_WINDOW};
use crate::error::{ProfileError, ProfileResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 可变区域搜索的参数.
///
/// 先用 `smooth_window` 平滑 IQR profile, 再用 `maxima_window` 查找局部极大值,
/// 最后取 IQR 最大的至多 `regions` 个位置.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariableRegionSpec {
    smooth_window: usize,
    maxima_window: usize,
    regions: usize,
}

impl VariableRegionSpec {
    /// 构建参数. 任何一项为 0 都会返回 `InvalidArgument`.
    pub fn new(smooth_window: usize, maxima_window: usize, regions: usize) -> ProfileResult<Self> {
        let spec = Self {
            smooth_window,
            maxima_window,
            regions,
        };
        spec.assert_args()?;
        Ok(spec)
    }

    fn assert_args(&self) -> ProfileResult<()> {
        for (name, value) in [
            ("smooth window", self.smooth_window),
            ("maxima window", self.maxima_window),
            ("region count", self.regions),
        ] {
            if value == 0 {
                return Err(ProfileError::invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    /// IQR profile 的平滑窗口.
    #[inline]
    pub fn smooth_window(&self) -> usize {
        self.smooth_window
    }

    /// 局部极大值的查找窗口.
    #[inline]
    pub fn maxima_window(&self) -> usize {
        self.maxima_window
    }

    /// 最多返回的区域个数.
    #[inline]
    pub fn regions(&self) -> usize {
        self.regions
    }
}

impl Default for VariableRegionSpec {
    fn default() -> Self {
        Self {
            smooth_window: VARIABLE_SMOOTH_WINDOW,
            maxima_window: VARIABLE_MAXIMA_WINDOW,
            regions: VARIABLE_REGION_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VariableRegionSpec;

    #[test]
    fn test_variable_region_spec() {
        let spec = VariableRegionSpec::default();
        assert_eq!((spec.smooth_window(), spec.maxima_window(), spec.regions()), (3, 3, 3));
        assert!(VariableRegionSpec::new(0, 3, 3).is_err());
        assert!(VariableRegionSpec::new(3, 0, 3).is_err());
        assert!(VariableRegionSpec::new(3, 3, 0).is_err());
        assert_eq!(VariableRegionSpec::new(3, 3, 3).unwrap(), spec);
    }
}
