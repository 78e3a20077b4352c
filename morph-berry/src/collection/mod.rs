//! 群体 profile 集合.
//!
//! 集合是一群细胞核在群体层面的共识:
//!
//! 1. 每种 [`ProfileType`] 一个 [`ProfileAggregate`], 所有 profile 以 Reference 为起点,
//!    并重采样到共同长度 `length`;
//! 2. 群体层面的标签索引 ([`TagIndexes`]);
//! 3. 可选的分段链, 总是以 Reference 为起点保存 (规范分段).
//!
//! 查询都通过 `&self` 完成并返回新的 profile, 修改都需要 `&mut self`.
//! 查询结果缓存在 [`Mutex`] 保护的 [`ProfileCache`] 中, 因此集合是 `Sync` 的.

mod cache;
mod record;

pub use record::CollectionRecord;

use crate::aggregate::ProfileAggregate;
use crate::config::VariableRegionSpec;
use crate::consts::quartile::{self, LOWER_QUARTILE, UPPER_QUARTILE};
use crate::error::{ProfileError, ProfileResult};
use crate::nucleus::{Population, ProfileType, Profileable};
use crate::profile::{project_index, Profile};
use crate::segment::{nudge, validate_chain, Segment, SegmentId, SegmentedProfile};
use crate::tag::{Tag, TagIndexes};
use binary_heap_plus::BinaryHeap;
use cache::ProfileCache;
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 群体 profile 集合.
#[derive(Debug, Default)]
pub struct ProfileCollection {
    length: usize,
    tags: TagIndexes,
    segments: Option<Vec<Segment>>,
    aggregates: HashMap<ProfileType, ProfileAggregate>,
    cache: Mutex<ProfileCache>,
}

impl ProfileCollection {
    /// 空集合: 只有 Reference 标签, 没有聚合与分段.
    pub fn new() -> Self {
        Self::default()
    }

    /// 聚合的共同长度. 尚未建立聚合时为 0 (或从持久化记录恢复的长度).
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// 是否已经建立聚合?
    #[inline]
    pub fn has_aggregate(&self) -> bool {
        !self.aggregates.is_empty()
    }

    /// 群体层面的标签索引.
    #[inline]
    pub fn tags(&self) -> &TagIndexes {
        &self.tags
    }

    /// 标签是否已登记?
    #[inline]
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// 标签的索引. 未登记时返回 `UnknownTag`.
    pub fn index_of(&self, tag: &Tag) -> ProfileResult<usize> {
        self.tags
            .index_of(tag)
            .ok_or_else(|| ProfileError::UnknownTag(tag.clone()))
    }

    /// 缓存版本号. 每次聚合或分段变化都会加一.
    pub fn cache_version(&self) -> u64 {
        self.cache().version()
    }

    fn cache(&self) -> MutexGuard<'_, ProfileCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cache_mut(&mut self) -> &mut ProfileCache {
        self.cache.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn aggregate(&self, ty: ProfileType) -> ProfileResult<&ProfileAggregate> {
        self.aggregates
            .get(&ty)
            .ok_or(ProfileError::UnknownProfileType(ty))
    }

    /// 以 `tag` 为起点的第 `quartile` 百分位数 profile.
    ///
    /// 结果是 `aggregate[ty].quartile(q).offset(index_of(tag))`, 会被缓存,
    /// 每次返回的都是独立的副本.
    pub fn profile(&self, ty: ProfileType, tag: &Tag, quartile: f64) -> ProfileResult<Profile> {
        let index = self.index_of(tag)?;
        let aggregate = self.aggregate(ty)?;
        if !quartile::is_valid(quartile) {
            return Err(ProfileError::invalid(format!(
                "quartile must be within [0, 100], got {quartile}"
            )));
        }
        if let Some(profile) = self.cache().get(ty, tag, quartile) {
            return Ok(profile);
        }

        let profile = aggregate.quartile(quartile)?.offset(index as isize);
        self.cache().insert(ty, tag, quartile, profile.clone());
        Ok(profile)
    }

    /// 以 `tag` 为起点的分段 profile.
    pub fn segmented_profile(
        &self,
        ty: ProfileType,
        tag: &Tag,
        quartile: f64,
    ) -> ProfileResult<SegmentedProfile> {
        let segments = self.segments(tag)?;
        let profile = self.profile(ty, tag, quartile)?;
        SegmentedProfile::new(profile, segments)
    }

    /// 以 `tag` 为起点的分段链: 规范分段平移 `-index_of(tag)`.
    pub fn segments(&self, tag: &Tag) -> ProfileResult<Vec<Segment>> {
        let index = self.index_of(tag)?;
        let segments = self.segments.as_deref().ok_or(ProfileError::NoSegments)?;
        nudge(segments, -(index as isize))
    }

    /// 登记或移动一个标签. Reference 不可移动, 此时什么也不做.
    ///
    /// 已知共同长度时 (已有聚合, 或从记录恢复), `index` 必须小于 `length`.
    pub fn add_index(&mut self, tag: &Tag, index: usize) -> ProfileResult<()> {
        if tag.is_reference() {
            debug!("ignoring attempt to move the reference tag to {index}");
            return Ok(());
        }
        if self.length != 0 && index >= self.length {
            return Err(ProfileError::OutOfRange {
                index,
                len: self.length,
            });
        }
        self.tags.assign(tag, index);
        self.cache_mut().forget_tag(tag);
        Ok(())
    }

    fn check_segments(&self, segments: &[Segment]) -> ProfileResult<()> {
        let first = segments
            .first()
            .ok_or_else(|| ProfileError::invalid("segment chain is empty"))?;
        if first.total_len() != self.length {
            return Err(ProfileError::LengthMismatch {
                expected: self.length,
                found: first.total_len(),
            });
        }
        validate_chain(segments)
    }

    /// 设置以 Reference 为起点的规范分段.
    pub fn add_segments(&mut self, segments: Vec<Segment>) -> ProfileResult<()> {
        self.check_segments(&segments)?;
        self.segments = Some(segments);
        self.cache_mut().invalidate();
        Ok(())
    }

    /// 设置以 `tag` 为起点的分段, 保存前平移 `index_of(tag)` 转换为规范分段.
    pub fn add_segments_from(&mut self, tag: &Tag, segments: Vec<Segment>) -> ProfileResult<()> {
        self.check_segments(&segments)?;
        let index = self.index_of(tag)?;
        let canonical = nudge(&segments, index as isize)?;
        self.segments = Some(canonical);
        self.cache_mut().invalidate();
        Ok(())
    }

    /// 是否有分段?
    #[inline]
    pub fn has_segments(&self) -> bool {
        self.segments.is_some()
    }

    /// 分段个数.
    pub fn segment_count(&self) -> usize {
        self.segments.as_ref().map_or(0, Vec::len)
    }

    /// 按链的顺序列出全部分段身份.
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        self.segments
            .iter()
            .flatten()
            .map(Segment::id)
            .collect()
    }

    /// 以 `tag` 为起点的分段链中第 `position` 个分段.
    pub fn segment_at(&self, tag: &Tag, position: usize) -> ProfileResult<Segment> {
        let segments = self.segments(tag)?;
        let len = segments.len();
        segments
            .get(position)
            .copied()
            .ok_or(ProfileError::OutOfRange {
                index: position,
                len,
            })
    }

    /// 从 `tag` 开始的分段.
    pub fn segment_starting_with(&self, tag: &Tag) -> ProfileResult<Option<Segment>> {
        Ok(self.segments(tag)?.into_iter().find(|s| s.start() == 0))
    }

    /// 在 `tag` 处结束的分段.
    pub fn segment_ending_with(&self, tag: &Tag) -> ProfileResult<Option<Segment>> {
        Ok(self.segments(tag)?.into_iter().find(|s| s.end() == 0))
    }

    /// 包含 `tag` 的分段.
    pub fn segment_containing_tag(&self, tag: &Tag) -> ProfileResult<Option<Segment>> {
        Ok(self.segments(tag)?.into_iter().find(|s| s.contains(0)))
    }

    /// 以 Reference 为起点时, 包含索引 `index` 的分段.
    pub fn segment_containing(&self, index: usize) -> ProfileResult<Option<Segment>> {
        let segments = self.segments.as_deref().ok_or(ProfileError::NoSegments)?;
        Ok(segments.iter().find(|s| s.contains(index)).copied())
    }

    /// 以 `tag` 为起点的四分位距 profile: `Q75 − Q25`.
    pub fn iqr_profile(&self, ty: ProfileType, tag: &Tag) -> ProfileResult<Profile> {
        let upper = self.profile(ty, tag, UPPER_QUARTILE)?;
        let lower = self.profile(ty, tag, LOWER_QUARTILE)?;
        upper.subtract(&lower)
    }

    /// 群体差异最大的至多三个位置 (以 `tag` 为起点的索引), IQR 从高到低排列.
    pub fn find_most_variable_regions(&self, ty: ProfileType, tag: &Tag) -> ProfileResult<Vec<usize>> {
        self.find_most_variable_regions_with(ty, tag, &VariableRegionSpec::default())
    }

    /// 同 [`ProfileCollection::find_most_variable_regions`], 窗口与个数由 `spec` 指定.
    ///
    /// IQR profile 平滑后查找局部极大值, 再按原始 IQR 值取最大的 `spec.regions()` 个.
    /// IQR 相同时先出现的位置优先. 极大值不足时返回的位置也更少.
    pub fn find_most_variable_regions_with(
        &self,
        ty: ProfileType,
        tag: &Tag,
        spec: &VariableRegionSpec,
    ) -> ProfileResult<Vec<usize>> {
        let iqr = self.iqr_profile(ty, tag)?;
        let maxima = iqr
            .smooth(spec.smooth_window())?
            .local_maxima(spec.maxima_window())?;

        // 堆顶是当前保留的最差候选: IQR 最小, 其次是最晚出现.
        let mut heap = BinaryHeap::new_by(rank);
        for index in maxima.indices() {
            heap.push((index, iqr.get(index)?));
            if heap.len() > spec.regions() {
                heap.pop();
            }
        }
        // 升序排列时最好的在最前.
        Ok(heap.into_sorted_vec().into_iter().map(|(i, _)| i).collect())
    }

    /// 某个位置上, 所有细胞核的值.
    pub fn values_at_position(&self, ty: ProfileType, position: f64) -> ProfileResult<Vec<f64>> {
        self.aggregate(ty)?.values_at_position(position)
    }

    /// 用 `population` 重建全部聚合, 共同长度为 `length`.
    ///
    /// 每个细胞核以 Reference 为起点的 profile 被重采样到 `length`.
    /// 无法提供某类 profile 的细胞核会被跳过; 没有任何数据的 profile 类型不建立聚合.
    /// 现有分段的长度与 `length` 不同时, 分段会被清除.
    pub fn create_profile_aggregate<P: Population>(
        &mut self,
        population: &P,
        length: usize,
    ) -> ProfileResult<()> {
        if length == 0 {
            return Err(ProfileError::invalid("aggregate length cannot be zero"));
        }
        if population.is_empty() {
            return Err(ProfileError::invalid("cannot aggregate an empty population"));
        }

        let mut aggregates = HashMap::new();
        for ty in ProfileType::ALL {
            let mut aggregate = ProfileAggregate::new(length)?;
            for (k, nucleus) in population.nuclei().iter().enumerate() {
                let profile = match nucleus.profile(ty, &Tag::Reference) {
                    Ok(p) if p.len() == length => p,
                    Ok(p) => p.interpolate(length)?,
                    Err(ProfileError::UnknownProfileType(_)) => continue,
                    Err(e) => {
                        warn!("nucleus {k} skipped for {ty} aggregate: {e}");
                        continue;
                    }
                };
                aggregate.add_values(&profile)?;
            }
            if aggregate.is_empty() {
                debug!("no nucleus provides a {ty} profile");
                continue;
            }
            aggregates.insert(ty, aggregate);
        }

        if let Some(segments) = &self.segments {
            if segments[0].total_len() != length {
                warn!(
                    "dropping {} segments of length {}: aggregate length is now {length}",
                    segments.len(),
                    segments[0].total_len()
                );
                self.segments = None;
            }
        }

        info!(
            "built {} aggregates of length {length} from {} nuclei",
            aggregates.len(),
            population.len()
        );
        self.rescale_tags(length);
        self.length = length;
        self.aggregates = aggregates;
        self.cache_mut().invalidate();
        Ok(())
    }

    /// 共同长度变为 `length` 时, 标签按比例换算到新长度.
    /// 之前长度未知时, 超出新长度的标签被移除.
    fn rescale_tags(&mut self, length: usize) {
        let old = self.length;
        if old == length {
            return;
        }
        let movable: Vec<(Tag, usize)> = self.tags.iter().filter(|(tag, _)| !tag.is_reference()).collect();
        for (tag, index) in movable {
            if old != 0 {
                let projected = project_index(index, old, length);
                debug!("tag {tag} moved from {index} of {old} to {projected} of {length}");
                self.tags.assign(&tag, projected);
            } else if index >= length {
                warn!("dropping tag {tag} at {index}: aggregate length is {length}");
                if let Tag::Movable(m) = &tag {
                    self.tags.remove(m);
                }
            }
        }
    }

    /// 以群体轮廓点数的中位数为共同长度, 重建全部聚合.
    pub fn create_profile_aggregate_default<P: Population>(&mut self, population: &P) -> ProfileResult<()> {
        self.create_profile_aggregate(population, population.median_boundary_len())
    }

    /// 重建全部聚合. 已有分段时沿用分段的长度, 使分段保持有效; 否则使用中位数长度.
    pub fn create_and_restore_profile_aggregate<P: Population>(
        &mut self,
        population: &P,
    ) -> ProfileResult<()> {
        let length = match self.segments.as_deref() {
            Some([first, ..]) => first.total_len(),
            _ => population.median_boundary_len(),
        };
        self.create_profile_aggregate(population, length)
    }
}

/// 候选排序: IQR 高者优先, 相同时先出现者优先.
fn rank(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

impl Display for ProfileCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Profile collection of length {}", self.length)?;
        for (tag, index) in self.tags.iter() {
            writeln!(f, "  {tag}: {index}")?;
        }
        match &self.segments {
            Some(segments) => {
                for s in segments {
                    writeln!(f, "  segment {s}")?;
                }
            }
            None => writeln!(f, "  no segments")?,
        }
        Ok(())
    }
}
