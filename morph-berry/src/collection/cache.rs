//! 集合内部的 profile 缓存.

use crate::nucleus::ProfileType;
use crate::profile::Profile;
use crate::tag::Tag;
use log::debug;
use ordered_float::NotNan;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    ty: ProfileType,
    tag: Tag,
    quartile: NotNan<f64>,
}

impl CacheKey {
    fn new(ty: ProfileType, tag: &Tag, quartile: f64) -> Option<Self> {
        Some(Self {
            ty,
            tag: tag.clone(),
            quartile: NotNan::new(quartile).ok()?,
        })
    }
}

/// 以 `(类型, 标签, 分位数)` 为键的 profile 缓存, 带版本号.
///
/// 聚合或分段发生变化时整体失效, 版本号加一; 标签移动时只丢弃该标签的条目.
#[derive(Debug, Default)]
pub(crate) struct ProfileCache {
    version: u64,
    entries: HashMap<CacheKey, Profile>,
}

impl ProfileCache {
    pub(crate) fn get(&self, ty: ProfileType, tag: &Tag, quartile: f64) -> Option<Profile> {
        let key = CacheKey::new(ty, tag, quartile)?;
        self.entries.get(&key).cloned()
    }

    pub(crate) fn insert(&mut self, ty: ProfileType, tag: &Tag, quartile: f64, profile: Profile) {
        if let Some(key) = CacheKey::new(ty, tag, quartile) {
            self.entries.insert(key, profile);
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.version += 1;
        debug!(
            "profile cache invalidated ({} entries dropped), now at version {}",
            self.entries.len(),
            self.version
        );
        self.entries.clear();
    }

    pub(crate) fn forget_tag(&mut self, tag: &Tag) {
        self.entries.retain(|key, _| key.tag != *tag);
    }

    #[inline]
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::ProfileCache;
    use crate::nucleus::ProfileType;
    use crate::profile::Profile;
    use crate::tag::Tag;

    #[test]
    fn test_cache_entries() {
        let mut cache = ProfileCache::default();
        let p = Profile::constant(1.0, 3).unwrap();
        cache.insert(ProfileType::Angle, &Tag::Reference, 50.0, p.clone());
        cache.insert(ProfileType::Angle, &Tag::ORIENTATION, 50.0, p.clone());
        assert_eq!(cache.get(ProfileType::Angle, &Tag::Reference, 50.0), Some(p));
        assert_eq!(cache.get(ProfileType::Angle, &Tag::Reference, 25.0), None);
        assert_eq!(cache.get(ProfileType::Radius, &Tag::Reference, 50.0), None);

        cache.forget_tag(&Tag::ORIENTATION);
        assert_eq!(cache.len(), 1);

        cache.invalidate();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.version(), 1);
    }
}
