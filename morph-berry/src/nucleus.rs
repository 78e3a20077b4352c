//! 细胞核与细胞核群体.
//!
//! 图像分割, 轮廓提取等上游步骤不在本 crate 范围内; 本模块只约定
//! 上游需要提供的接口 ([`Profileable`], [`Population`]), 并提供一组简单的具体实现.

use crate::aggregate::percentile;
use crate::consts::quartile::MEDIAN;
use crate::error::{ProfileError, ProfileResult};
use crate::profile::Profile;
use crate::tag::{Tag, TagIndexes};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 沿轮廓测量的量.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProfileType {
    /// 边界转角 (度). 180 表示直线边界.
    Angle,
    /// 经过质心的直径.
    Diameter,
    /// 到质心的距离.
    Radius,
}

impl ProfileType {
    /// 全部 profile 类型.
    pub const ALL: [ProfileType; 3] = [ProfileType::Angle, ProfileType::Diameter, ProfileType::Radius];
}

impl Display for ProfileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProfileType::Angle => "angle",
            ProfileType::Diameter => "diameter",
            ProfileType::Radius => "radius",
        })
    }
}

/// 能够给出 profile 的对象 (一般是一个细胞核).
pub trait Profileable {
    /// 以 `tag` 为起点的 `ty` 类型 profile.
    fn profile(&self, ty: ProfileType, tag: &Tag) -> ProfileResult<Profile>;

    /// 轮廓点数, 也就是 profile 长度.
    fn boundary_len(&self) -> usize;

    /// 自身的标签索引.
    fn tag_indexes(&self) -> &TagIndexes;
}

/// 细胞核群体.
pub trait Population {
    /// 群体成员类型.
    type Nucleus: Profileable;

    /// 全部成员.
    fn nuclei(&self) -> &[Self::Nucleus];

    /// 成员个数.
    #[inline]
    fn len(&self) -> usize {
        self.nuclei().len()
    }

    /// 是否为空?
    #[inline]
    fn is_empty(&self) -> bool {
        self.nuclei().is_empty()
    }

    /// 轮廓点数的中位数. 空群体返回 0.
    fn median_boundary_len(&self) -> usize {
        percentile(self.nuclei().iter().map(|n| n.boundary_len() as f64), MEDIAN)
            .map_or(0, |m| m as usize)
    }
}

/// 一个细胞核: 以 Reference 为起点的各类 profile, 以及自身的标签.
#[derive(Clone, Debug)]
pub struct Nucleus {
    boundary_len: usize,
    profiles: HashMap<ProfileType, Profile>,
    tags: TagIndexes,
}

impl Nucleus {
    /// 由角度 profile 构建细胞核. 轮廓点数即 `angle` 的长度.
    pub fn new(angle: Profile) -> Self {
        Self {
            boundary_len: angle.len(),
            profiles: HashMap::from([(ProfileType::Angle, angle)]),
            tags: TagIndexes::new(),
        }
    }

    /// 增加 (或替换) 一种 profile. 长度必须等于轮廓点数.
    pub fn with_profile(mut self, ty: ProfileType, profile: Profile) -> ProfileResult<Self> {
        if profile.len() != self.boundary_len {
            return Err(ProfileError::LengthMismatch {
                expected: self.boundary_len,
                found: profile.len(),
            });
        }
        self.profiles.insert(ty, profile);
        Ok(self)
    }

    /// 登记自身的标签. Reference 被忽略并返回 `Ok(false)`.
    pub fn set_tag(&mut self, tag: &Tag, index: usize) -> ProfileResult<bool> {
        if index >= self.boundary_len {
            return Err(ProfileError::OutOfRange {
                index,
                len: self.boundary_len,
            });
        }
        Ok(self.tags.assign(tag, index))
    }
}

impl Profileable for Nucleus {
    fn profile(&self, ty: ProfileType, tag: &Tag) -> ProfileResult<Profile> {
        let profile = self
            .profiles
            .get(&ty)
            .ok_or(ProfileError::UnknownProfileType(ty))?;
        let index = self
            .tags
            .index_of(tag)
            .ok_or_else(|| ProfileError::UnknownTag(tag.clone()))?;
        Ok(profile.offset(index as isize))
    }

    #[inline]
    fn boundary_len(&self) -> usize {
        self.boundary_len
    }

    #[inline]
    fn tag_indexes(&self) -> &TagIndexes {
        &self.tags
    }
}

/// 细胞核群体的简单实现.
#[derive(Clone, Debug, Default)]
pub struct CellPopulation {
    nuclei: Vec<Nucleus>,
}

impl CellPopulation {
    /// 由细胞核列表构建.
    pub fn new(nuclei: Vec<Nucleus>) -> Self {
        Self { nuclei }
    }

    /// 加入一个细胞核.
    pub fn push(&mut self, nucleus: Nucleus) {
        self.nuclei.push(nucleus);
    }

    /// 可变访问全部细胞核.
    pub fn nuclei_mut(&mut self) -> &mut [Nucleus] {
        &mut self.nuclei
    }
}

impl Population for CellPopulation {
    type Nucleus = Nucleus;

    #[inline]
    fn nuclei(&self) -> &[Nucleus] {
        &self.nuclei
    }
}

impl FromIterator<Nucleus> for CellPopulation {
    fn from_iter<T: IntoIterator<Item = Nucleus>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nucleus_profiles() {
        let angle = Profile::new((0..8).map(f64::from).collect()).unwrap();
        let mut nucleus = Nucleus::new(angle.clone());
        assert_eq!(nucleus.boundary_len(), 8);
        assert_eq!(nucleus.profile(ProfileType::Angle, &Tag::Reference).unwrap(), angle);
        assert_eq!(
            nucleus.profile(ProfileType::Radius, &Tag::Reference),
            Err(ProfileError::UnknownProfileType(ProfileType::Radius))
        );
        assert!(nucleus.profile(ProfileType::Angle, &Tag::ORIENTATION).is_err());

        assert_eq!(nucleus.set_tag(&Tag::ORIENTATION, 3), Ok(true));
        assert_eq!(nucleus.set_tag(&Tag::Reference, 3), Ok(false));
        assert!(nucleus.set_tag(&Tag::ORIENTATION, 8).is_err());
        assert_eq!(
            nucleus.profile(ProfileType::Angle, &Tag::ORIENTATION).unwrap(),
            angle.offset(3)
        );

        assert!(nucleus
            .clone()
            .with_profile(ProfileType::Radius, Profile::constant(1.0, 7).unwrap())
            .is_err());
    }

    #[test]
    fn test_median_boundary_len() {
        let population: CellPopulation = [90, 100, 120, 101]
            .into_iter()
            .map(|n| Nucleus::new(Profile::constant(180.0, n).unwrap()))
            .collect();
        assert_eq!(population.len(), 4);
        // pos = 2.5: 100 + 0.5 * (101 - 100)
        assert_eq!(population.median_boundary_len(), 100);
        assert_eq!(CellPopulation::default().median_boundary_len(), 0);
    }
}
