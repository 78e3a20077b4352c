//! 通用常量.

/// 分位数.
pub mod quartile {
    /// 下四分位数.
    pub const LOWER_QUARTILE: f64 = 25.0;

    /// 中位数.
    pub const MEDIAN: f64 = 50.0;

    /// 上四分位数.
    pub const UPPER_QUARTILE: f64 = 75.0;

    /// 分位数是否落在 `[0, 100]` 内?
    #[inline]
    pub fn is_valid(q: f64) -> bool {
        (0.0..=100.0).contains(&q)
    }
}

/// Reference 标签在 profile 中的固定位置.
pub const ZERO_INDEX: usize = 0;

/// 角度 profile 中 "直线边界" 对应的角度值 (单位: 度).
pub const STRAIGHT_ANGLE: f64 = 180.0;

/// 可变区域搜索中, IQR profile 的默认平滑窗口.
pub const VARIABLE_SMOOTH_WINDOW: usize = 3;

/// 可变区域搜索中, 局部极大值的默认查找窗口.
pub const VARIABLE_MAXIMA_WINDOW: usize = 3;

/// 可变区域搜索默认返回的最多区域个数.
pub const VARIABLE_REGION_COUNT: usize = 3;
