//! 运行时错误.

use crate::nucleus::ProfileType;
use crate::tag::Tag;
use thiserror::Error;

/// profile / 分段 / 聚合操作的运行时错误.
///
/// 这些错误都是可恢复的局部错误, 由直接调用者处理.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// 索引超出 profile 范围 `[0, len)`.
    #[error("index {index} is out of range for length {len}")]
    OutOfRange {
        /// 请求的索引.
        index: usize,
        /// 实际长度.
        len: usize,
    },

    /// profile 或分段的长度与聚合 / 集合的期望长度不一致.
    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch {
        /// 期望长度.
        expected: usize,
        /// 实际长度.
        found: usize,
    },

    /// 查询了未登记的标签.
    #[error("tag `{0}` is not present")]
    UnknownTag(Tag),

    /// 查询了没有聚合数据的 profile 类型.
    #[error("profile type `{0}` is not present")]
    UnknownProfileType(ProfileType),

    /// 请求分段视图, 但集合中没有分段.
    #[error("no segments assigned")]
    NoSegments,

    /// 聚合中尚未加入任何 profile.
    #[error("aggregate is empty")]
    EmptyAggregate,

    /// 非法参数 (如窗口为 0, 分位数超出 `[0, 100]`, 分段链断裂).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ProfileError {
    #[inline]
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// profile 模型运行时结果.
pub type ProfileResult<T> = Result<T, ProfileError>;
