//! 布尔 profile: 局部极值搜索的返回值.

use crate::error::{ProfileError, ProfileResult};
use itertools::izip;

/// 与某个 profile 等长的环形布尔序列.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BooleanProfile {
    flags: Vec<bool>,
}

#[allow(clippy::len_without_is_empty)]
impl BooleanProfile {
    /// 内部方法. 调用者保证 `flags` 非空.
    pub(crate) fn from_flags(flags: Vec<bool>) -> Self {
        debug_assert!(!flags.is_empty());
        Self { flags }
    }

    /// 构建全为 `value`, 长度为 `len` 的布尔 profile.
    pub fn filled(value: bool, len: usize) -> ProfileResult<Self> {
        if len == 0 {
            return Err(ProfileError::invalid("profile length cannot be zero"));
        }
        Ok(Self::from_flags(vec![value; len]))
    }

    /// 长度.
    #[inline]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// 位置 `index` 的标记. 不做环形回绕.
    pub fn get(&self, index: usize) -> ProfileResult<bool> {
        self.flags
            .get(index)
            .copied()
            .ok_or(ProfileError::OutOfRange {
                index,
                len: self.len(),
            })
    }

    /// 为 `true` 的位置个数.
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// 按升序迭代所有为 `true` 的位置.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
    }

    fn zip_with(&self, other: &Self, f: impl Fn(bool, bool) -> bool) -> ProfileResult<Self> {
        if self.len() != other.len() {
            return Err(ProfileError::LengthMismatch {
                expected: self.len(),
                found: other.len(),
            });
        }
        Ok(Self::from_flags(
            izip!(&self.flags, &other.flags)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        ))
    }

    /// 逐点与.
    pub fn and(&self, other: &Self) -> ProfileResult<Self> {
        self.zip_with(other, |a, b| a && b)
    }

    /// 逐点或.
    pub fn or(&self, other: &Self) -> ProfileResult<Self> {
        self.zip_with(other, |a, b| a || b)
    }

    /// 逐点取反.
    pub fn not(&self) -> Self {
        Self::from_flags(self.flags.iter().map(|f| !f).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::BooleanProfile;

    #[test]
    fn test_boolean_ops() {
        let a = BooleanProfile::from_flags(vec![true, false, true, false]);
        let b = BooleanProfile::from_flags(vec![true, true, false, false]);
        assert_eq!(a.count(), 2);
        assert_eq!(a.indices().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(a.and(&b).unwrap().indices().collect::<Vec<_>>(), vec![0]);
        assert_eq!(a.or(&b).unwrap().count(), 3);
        assert_eq!(a.not().indices().collect::<Vec<_>>(), vec![1, 3]);
        assert!(a.get(4).is_err());
        assert!(a
            .and(&BooleanProfile::filled(true, 3).unwrap())
            .is_err());
    }
}
