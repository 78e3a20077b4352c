//! 分段模型.
//!
//! 一个分段覆盖环形半开区间 `[start, end)`:
//!
//! 1. `end > start` 时不跨过索引 0;
//! 2. `end <= start` 时跨过索引 0;
//! 3. 只有一个分段且 `start == end` 时, 它覆盖整个环.
//!
//! 同一个 profile 的分段首尾相连地铺满整个环: 第 k 段的 `end` 等于第 k+1 段的 `start`,
//! 最后一段的 `end` 等于第一段的 `start`, 所有分段的长度之和等于 `total_len`.
//! 分段通过 [`SegmentId`] 追踪身份, 而不是它在列表中的位置.

mod profiled;

pub use profiled::SegmentedProfile;

use crate::error::{ProfileError, ProfileResult};
use crate::profile::wrap_index;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 分段的稳定身份.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentId(Uuid);

impl SegmentId {
    /// 随机生成一个新身份.
    #[inline]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// 底层 UUID.
    #[inline]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SegmentId {
    #[inline]
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl Display for SegmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 环上的一个分段.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    id: SegmentId,
    start: usize,
    end: usize,
    total_len: usize,
}

#[allow(clippy::len_without_is_empty)]
impl Segment {
    /// 使用随机身份构建分段.
    pub fn new(start: usize, end: usize, total_len: usize) -> ProfileResult<Self> {
        Self::with_id(SegmentId::new_v4(), start, end, total_len)
    }

    /// 使用给定身份构建分段.
    ///
    /// `total_len` 为 0 时返回 `InvalidArgument`, `start` 或 `end` 超出 `[0, total_len)`
    /// 时返回 `OutOfRange`.
    pub fn with_id(id: SegmentId, start: usize, end: usize, total_len: usize) -> ProfileResult<Self> {
        if total_len == 0 {
            return Err(ProfileError::invalid("segment total length cannot be zero"));
        }
        for index in [start, end] {
            if index >= total_len {
                return Err(ProfileError::OutOfRange {
                    index,
                    len: total_len,
                });
            }
        }
        Ok(Self {
            id,
            start,
            end,
            total_len,
        })
    }

    /// 身份.
    #[inline]
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// 起点 (包含).
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// 终点 (不包含).
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// 所在 profile 的长度.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// 是否跨过索引 0?
    #[inline]
    pub fn wraps(&self) -> bool {
        self.end <= self.start
    }

    /// 覆盖的位置个数.
    pub fn len(&self) -> usize {
        if self.wraps() {
            self.end + self.total_len - self.start
        } else {
            self.end - self.start
        }
    }

    /// `index` 是否落在 `[start, end)` 内 (环形)?
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.total_len {
            return false;
        }
        if self.wraps() {
            index >= self.start || index < self.end
        } else {
            (self.start..self.end).contains(&index)
        }
    }

    /// 分段中点的索引.
    pub fn mid_index(&self) -> usize {
        (self.start + self.len() / 2) % self.total_len
    }

    /// 起止点同时平移 `offset` (环形), 身份与长度不变.
    pub(crate) fn shifted(&self, offset: isize) -> Segment {
        let shift = |index: usize| wrap_index(index as isize + offset, self.total_len);
        Segment {
            start: shift(self.start),
            end: shift(self.end),
            ..*self
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}, {}) of {}",
            self.id, self.start, self.end, self.total_len
        )
    }
}

/// 检查 `segments` 是否是一条合法的分段链.
///
/// 要求非空, `total_len` 一致, 首尾相连 (包括最后一段回到第一段), 长度之和等于 `total_len`.
pub fn validate_chain(segments: &[Segment]) -> ProfileResult<()> {
    let first = segments
        .first()
        .ok_or_else(|| ProfileError::invalid("segment chain is empty"))?;
    let total_len = first.total_len;
    if let Some(s) = segments.iter().find(|s| s.total_len != total_len) {
        return Err(ProfileError::LengthMismatch {
            expected: total_len,
            found: s.total_len,
        });
    }

    let count = segments.len();
    for (k, current) in segments.iter().enumerate() {
        let next = &segments[(k + 1) % count];
        if current.end != next.start {
            return Err(ProfileError::invalid(format!(
                "segment {} ends at {} but segment {} starts at {}",
                current.id, current.end, next.id, next.start
            )));
        }
    }

    let covered: usize = segments.iter().map(Segment::len).sum();
    if covered != total_len {
        return Err(ProfileError::invalid(format!(
            "segments cover {covered} positions of a ring of {total_len}"
        )));
    }
    Ok(())
}

/// 所有分段的起止点同时平移 `offset` (环形), 返回新的分段链.
///
/// 输入或结果不是合法分段链时返回 `InvalidArgument`.
pub fn nudge(segments: &[Segment], offset: isize) -> ProfileResult<Vec<Segment>> {
    validate_chain(segments)?;
    let nudged: Vec<Segment> = segments.iter().map(|s| s.shifted(offset)).collect();
    validate_chain(&nudged)?;
    Ok(nudged)
}

/// 用 `(身份, 起点)` 列表重建分段链: 每一段的终点是下一段的起点.
pub fn from_starts(pairs: &[(SegmentId, usize)], total_len: usize) -> ProfileResult<Vec<Segment>> {
    let count = pairs.len();
    let segments = pairs
        .iter()
        .enumerate()
        .map(|(k, &(id, start))| Segment::with_id(id, start, pairs[(k + 1) % count].1, total_len))
        .collect::<ProfileResult<Vec<_>>>()?;
    validate_chain(&segments)?;
    Ok(segments)
}
