//! 轮廓上的命名标记 (landmark).
//!
//! Reference 标签固定位于索引 0, 它决定了 profile 的起点.
//! 其余标签都是可移动的, 由 [`TagIndexes`] 记录它们相对 Reference 的索引.

use crate::consts::ZERO_INDEX;
use crate::error::{ProfileError, ProfileResult};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 可移动的标签.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MovableTag {
    /// 方向标记.
    Orientation,
    /// 竖直方向上端.
    TopVertical,
    /// 竖直方向下端.
    BottomVertical,
    /// 与对称轴的交点.
    Intersection,
    /// 用户自定义标签, 例如精子头部的 Tip.
    Custom(String),
}

/// 标签: 要么是固定的 Reference, 要么是可移动标签.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Tag {
    /// 固定在索引 0 的参考点.
    Reference,
    /// 可移动标签.
    Movable(MovableTag),
}

impl Tag {
    /// 方向标记.
    pub const ORIENTATION: Tag = Tag::Movable(MovableTag::Orientation);
    /// 竖直方向上端.
    pub const TOP_VERTICAL: Tag = Tag::Movable(MovableTag::TopVertical);
    /// 竖直方向下端.
    pub const BOTTOM_VERTICAL: Tag = Tag::Movable(MovableTag::BottomVertical);
    /// 与对称轴的交点.
    pub const INTERSECTION: Tag = Tag::Movable(MovableTag::Intersection);

    /// 按名字构造标签. 内置名字解析为内置标签, 其余名字成为自定义标签.
    pub fn named(name: &str) -> ProfileResult<Tag> {
        name.parse()
    }

    /// 是否为 Reference?
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Tag::Reference)
    }
}

const REFERENCE: &str = "reference";
const ORIENTATION: &str = "orientation";
const TOP_VERTICAL: &str = "top-vertical";
const BOTTOM_VERTICAL: &str = "bottom-vertical";
const INTERSECTION: &str = "intersection";

impl Display for MovableTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MovableTag::Orientation => f.write_str(ORIENTATION),
            MovableTag::TopVertical => f.write_str(TOP_VERTICAL),
            MovableTag::BottomVertical => f.write_str(BOTTOM_VERTICAL),
            MovableTag::Intersection => f.write_str(INTERSECTION),
            MovableTag::Custom(name) => f.write_str(name),
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Reference => f.write_str(REFERENCE),
            Tag::Movable(tag) => tag.fmt(f),
        }
    }
}

impl FromStr for Tag {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s {
            "" => return Err(ProfileError::invalid("tag name cannot be empty")),
            REFERENCE => Tag::Reference,
            ORIENTATION => Tag::ORIENTATION,
            TOP_VERTICAL => Tag::TOP_VERTICAL,
            BOTTOM_VERTICAL => Tag::BOTTOM_VERTICAL,
            INTERSECTION => Tag::INTERSECTION,
            name => Tag::Movable(MovableTag::Custom(name.to_owned())),
        })
    }
}

impl From<MovableTag> for Tag {
    #[inline]
    fn from(value: MovableTag) -> Self {
        Tag::Movable(value)
    }
}

/// 标签到索引的映射.
///
/// 只保存可移动标签; Reference 没有存储位置, 永远解析为 [`ZERO_INDEX`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagIndexes {
    movable: BTreeMap<MovableTag, usize>,
}

#[allow(clippy::len_without_is_empty)]
impl TagIndexes {
    /// 只包含 Reference 的映射.
    pub fn new() -> Self {
        Self::default()
    }

    /// 标签的索引. Reference 总是 0; 未登记的可移动标签返回 `None`.
    pub fn index_of(&self, tag: &Tag) -> Option<usize> {
        match tag {
            Tag::Reference => Some(ZERO_INDEX),
            Tag::Movable(m) => self.movable.get(m).copied(),
        }
    }

    /// 标签是否已登记?
    #[inline]
    pub fn contains(&self, tag: &Tag) -> bool {
        self.index_of(tag).is_some()
    }

    /// 登记或更新标签的索引. Reference 不可移动, 此时返回 `false` 且不做任何改动.
    pub fn assign(&mut self, tag: &Tag, index: usize) -> bool {
        match tag {
            Tag::Reference => false,
            Tag::Movable(m) => {
                self.movable.insert(m.clone(), index);
                true
            }
        }
    }

    /// 移除一个可移动标签, 返回它原来的索引.
    pub fn remove(&mut self, tag: &MovableTag) -> Option<usize> {
        self.movable.remove(tag)
    }

    /// 标签个数, 包括 Reference.
    #[inline]
    pub fn len(&self) -> usize {
        self.movable.len() + 1
    }

    /// 迭代 `(标签, 索引)`, Reference 在最前.
    pub fn iter(&self) -> impl Iterator<Item = (Tag, usize)> + '_ {
        std::iter::once((Tag::Reference, ZERO_INDEX)).chain(
            self.movable
                .iter()
                .map(|(tag, &index)| (Tag::Movable(tag.clone()), index)),
        )
    }

    /// 迭代全部标签, Reference 在最前.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.iter().map(|(tag, _)| tag)
    }
}
