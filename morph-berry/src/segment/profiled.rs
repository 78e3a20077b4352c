//! 带分段的 profile.
//!
//! 分段编辑 (移动端点, 合并, 拆分, 翻转) 都返回新的 [`SegmentedProfile`],
//! 结果中的分段链总是合法的. 合并得到的分段会记住它的来源分段,
//! 之后可以用 [`SegmentedProfile::unmerge`] 还原.

use super::{nudge, validate_chain, Segment, SegmentId};
use crate::error::{ProfileError, ProfileResult};
use crate::profile::{wrap_index, Profile};
use std::collections::BTreeMap;

/// profile 及其上一条等长的合法分段链.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentedProfile {
    profile: Profile,
    segments: Vec<Segment>,
    merge_sources: BTreeMap<SegmentId, Vec<Segment>>,
}

impl SegmentedProfile {
    /// 组合 profile 与分段链. 分段链必须合法, 且 `total_len` 与 profile 长度一致.
    pub fn new(profile: Profile, segments: Vec<Segment>) -> ProfileResult<Self> {
        validate_chain(&segments)?;
        let total_len = segments[0].total_len();
        if total_len != profile.len() {
            return Err(ProfileError::LengthMismatch {
                expected: profile.len(),
                found: total_len,
            });
        }
        Ok(Self {
            profile,
            segments,
            merge_sources: BTreeMap::new(),
        })
    }

    /// profile.
    #[inline]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// 分段链.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 拆成 profile 与分段链.
    pub fn into_parts(self) -> (Profile, Vec<Segment>) {
        (self.profile, self.segments)
    }

    /// 按身份查找分段.
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id() == id)
    }

    fn position(&self, id: SegmentId) -> ProfileResult<usize> {
        self.segments
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| ProfileError::invalid(format!("no segment with id {id}")))
    }

    fn ensure_fresh(&self, id: SegmentId) -> ProfileResult<()> {
        if self.segment(id).is_some() {
            return Err(ProfileError::invalid(format!("segment id {id} is already in use")));
        }
        Ok(())
    }

    /// 链中第 `position` 个分段.
    pub fn segment_at(&self, position: usize) -> ProfileResult<&Segment> {
        self.segments.get(position).ok_or(ProfileError::OutOfRange {
            index: position,
            len: self.segments.len(),
        })
    }

    /// 按链的顺序列出全部分段身份.
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        self.segments.iter().map(Segment::id).collect()
    }

    /// 合并出分段 `id` 的两个来源分段. 不是合并得到的分段返回空切片.
    pub fn merge_sources(&self, id: SegmentId) -> &[Segment] {
        self.merge_sources
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 一个分段覆盖的 profile 值.
    pub fn segment_subregion(&self, id: SegmentId) -> ProfileResult<Profile> {
        let segment = &self.segments[self.position(id)?];
        let last = self.profile.wrap(segment.end() as isize - 1);
        self.profile.subregion(segment.start(), last)
    }

    /// profile 旋转 `j`, 分段同时平移 `-j`, 使每个分段仍然覆盖同样的值.
    pub fn offset(&self, j: isize) -> ProfileResult<SegmentedProfile> {
        Ok(Self {
            profile: self.profile.offset(j),
            segments: nudge(&self.segments, -j)?,
            merge_sources: self.map_sources(|s| Ok(s.shifted(-j)))?,
        })
    }

    fn map_sources(
        &self,
        f: impl Fn(&Segment) -> ProfileResult<Segment>,
    ) -> ProfileResult<BTreeMap<SegmentId, Vec<Segment>>> {
        let mut mapped = BTreeMap::new();
        for (&id, sources) in &self.merge_sources {
            mapped.insert(id, sources.iter().map(&f).collect::<ProfileResult<Vec<_>>>()?);
        }
        Ok(mapped)
    }

    fn rebuilt(
        &self,
        segments: Vec<Segment>,
        merge_sources: BTreeMap<SegmentId, Vec<Segment>>,
    ) -> ProfileResult<SegmentedProfile> {
        validate_chain(&segments)?;
        Ok(Self {
            profile: self.profile.clone(),
            segments,
            merge_sources,
        })
    }

    /// 把分段 `id` 的端点移动到 `[start, end)`, 前一段的终点与后一段的起点随之移动.
    ///
    /// 新端点只能落在该分段或相邻两段之内; 越过相邻分段, 或者使任何分段长度变为 0 时
    /// 返回 `InvalidArgument`.
    pub fn update(&self, id: SegmentId, start: usize, end: usize) -> ProfileResult<SegmentedProfile> {
        let total_len = self.profile.len();
        let k = self.position(id)?;
        let count = self.segments.len();
        let (prev, next) = ((k + count - 1) % count, (k + 1) % count);
        for index in [start, end] {
            if index >= total_len {
                return Err(ProfileError::OutOfRange { index, len: total_len });
            }
            if ![prev, k, next].iter().any(|&p| self.segments[p].contains(index)) {
                return Err(ProfileError::invalid(format!(
                    "index {index} lies beyond the neighbours of segment {id}"
                )));
            }
        }

        let mut segments = self.segments.clone();
        let before = segments[prev];
        segments[prev] = Segment::with_id(before.id(), before.start(), start, total_len)?;
        let after = segments[next];
        segments[next] = Segment::with_id(after.id(), end, after.end(), total_len)?;
        segments[k] = Segment::with_id(id, start, end, total_len)?;
        self.rebuilt(segments, self.merge_sources.clone())
    }

    /// 把相邻的两个分段合并为身份为 `id` 的一个分段, 合并结果记住两个来源分段.
    ///
    /// `first` 与 `second` 的先后顺序无关. 两段不相邻或 `id` 已被使用时返回 `InvalidArgument`.
    pub fn merge(&self, first: SegmentId, second: SegmentId, id: SegmentId) -> ProfileResult<SegmentedProfile> {
        let (a, b) = (self.position(first)?, self.position(second)?);
        self.ensure_fresh(id)?;
        let count = self.segments.len();
        let (head, tail) = match (a, b) {
            _ if a == b => {
                return Err(ProfileError::invalid(format!("cannot merge segment {first} with itself")))
            }
            _ if (a + 1) % count == b => (a, b),
            _ if (b + 1) % count == a => (b, a),
            _ => {
                return Err(ProfileError::invalid(format!(
                    "segments {first} and {second} are not adjacent"
                )))
            }
        };

        let (head_segment, tail_segment) = (self.segments[head], self.segments[tail]);
        let merged = Segment::with_id(
            id,
            head_segment.start(),
            tail_segment.end(),
            self.profile.len(),
        )?;
        let segments = self
            .segments
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != tail)
            .map(|(i, s)| if i == head { merged } else { *s })
            .collect();
        let mut merge_sources = self.merge_sources.clone();
        merge_sources.insert(id, vec![head_segment, tail_segment]);
        self.rebuilt(segments, merge_sources)
    }

    /// 把合并得到的分段 `id` 还原为它的来源分段.
    ///
    /// `id` 不是合并得到的分段, 或者合并后端点已被移动导致来源分段无法铺回原位时,
    /// 返回 `InvalidArgument`.
    pub fn unmerge(&self, id: SegmentId) -> ProfileResult<SegmentedProfile> {
        let k = self.position(id)?;
        let sources = self
            .merge_sources
            .get(&id)
            .ok_or_else(|| ProfileError::invalid(format!("segment {id} has no merge sources")))?;
        let mut segments = self.segments.clone();
        segments.splice(k..=k, sources.iter().copied());
        let mut merge_sources = self.merge_sources.clone();
        merge_sources.remove(&id);
        self.rebuilt(segments, merge_sources)
    }

    /// 在 `index` 处把分段 `id` 拆成 `[start, index)` 与 `[index, end)` 两段,
    /// 身份分别为 `first_id` 与 `second_id`.
    ///
    /// `index` 必须严格落在分段内部 (不能是起点).
    pub fn split(
        &self,
        id: SegmentId,
        index: usize,
        first_id: SegmentId,
        second_id: SegmentId,
    ) -> ProfileResult<SegmentedProfile> {
        let k = self.position(id)?;
        let segment = self.segments[k];
        if !segment.contains(index) || index == segment.start() {
            return Err(ProfileError::invalid(format!(
                "split index {index} is not inside segment {segment}"
            )));
        }
        if first_id == second_id {
            return Err(ProfileError::invalid("split segments need distinct ids"));
        }
        self.ensure_fresh(first_id)?;
        self.ensure_fresh(second_id)?;

        let total_len = self.profile.len();
        let parts = [
            Segment::with_id(first_id, segment.start(), index, total_len)?,
            Segment::with_id(second_id, index, segment.end(), total_len)?,
        ];
        let mut segments = self.segments.clone();
        segments.splice(k..=k, parts);
        self.rebuilt(segments, self.merge_sources.clone())
    }

    /// 翻转 profile, 分段随之翻转: 每个分段仍覆盖同样的值 (顺序相反), 链的顺序也相反.
    pub fn reverse(&self) -> ProfileResult<SegmentedProfile> {
        let total_len = self.profile.len();
        let mirror = |s: &Segment| {
            let flip = |index: usize| wrap_index(total_len as isize - index as isize, total_len);
            Segment::with_id(s.id(), flip(s.end()), flip(s.start()), total_len)
        };
        let segments = self
            .segments
            .iter()
            .rev()
            .map(&mirror)
            .collect::<ProfileResult<Vec<_>>>()?;
        let mut merge_sources = self.map_sources(&mirror)?;
        merge_sources.values_mut().for_each(|sources| sources.reverse());
        validate_chain(&segments)?;
        Ok(Self {
            profile: self.profile.reverse(),
            segments,
            merge_sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SegmentedProfile;
    use crate::error::ProfileError;
    use crate::profile::Profile;
    use crate::segment::tests::chain;
    use crate::segment::{Segment, SegmentId};

    fn ramp() -> Profile {
        Profile::new((0..10).map(f64::from).collect()).unwrap()
    }

    fn starts(sp: &SegmentedProfile) -> Vec<usize> {
        sp.segments().iter().map(Segment::start).collect()
    }

    #[test]
    fn test_segmented_profile_init() {
        assert!(SegmentedProfile::new(ramp(), chain(&[0, 4], 10)).is_ok());
        assert!(SegmentedProfile::new(ramp(), chain(&[0, 4], 12)).is_err());
    }

    #[test]
    fn test_segment_subregion() {
        let sp = SegmentedProfile::new(ramp(), chain(&[2, 7], 10)).unwrap();
        let ids = sp.segment_ids();
        assert_eq!(sp.segment_subregion(ids[0]).unwrap().to_vec(), vec![2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(sp.segment_subregion(ids[1]).unwrap().to_vec(), vec![7.0, 8.0, 9.0, 0.0, 1.0]);

        let whole = SegmentedProfile::new(ramp(), chain(&[3], 10)).unwrap();
        let id = whole.segment_ids()[0];
        assert_eq!(whole.segment_subregion(id).unwrap().len(), 10);
        assert!(whole.segment_at(1).is_err());
        assert!(whole.segment_subregion(SegmentId::new_v4()).is_err());
    }

    #[test]
    fn test_offset_keeps_values() {
        let sp = SegmentedProfile::new(ramp(), chain(&[2, 7], 10)).unwrap();
        let moved = sp.offset(4).unwrap();
        assert_eq!(moved.segments()[0].start(), 8);
        for id in sp.segment_ids() {
            assert_eq!(
                moved.segment_subregion(id).unwrap(),
                sp.segment_subregion(id).unwrap()
            );
        }
    }

    #[test]
    fn test_update_moves_neighbours() {
        let sp = SegmentedProfile::new(ramp(), chain(&[0, 3, 6], 10)).unwrap();
        let ids = sp.segment_ids();

        let moved = sp.update(ids[1], 2, 8).unwrap();
        assert_eq!(starts(&moved), vec![0, 2, 8]);
        assert_eq!(moved.segment_ids(), ids);
        assert_eq!(moved.segments()[0].end(), 2);
        assert_eq!(moved.segments()[2].len(), 2);

        // 首段的前一段是末段.
        let wrapped = sp.update(ids[0], 8, 4).unwrap();
        assert_eq!(starts(&wrapped), vec![8, 4, 6]);
        assert_eq!(wrapped.segments()[2].end(), 8);
    }

    #[test]
    fn test_update_err() {
        let sp = SegmentedProfile::new(ramp(), chain(&[0, 2, 5, 8], 10)).unwrap();
        let ids = sp.segment_ids();
        // 9 落在不相邻的末段内.
        assert!(sp.update(ids[1], 2, 9).is_err());
        // 前一段长度变为 0.
        assert!(sp.update(ids[1], 0, 5).is_err());
        assert_eq!(
            sp.update(ids[1], 2, 10),
            Err(ProfileError::OutOfRange { index: 10, len: 10 })
        );
        assert!(sp.update(SegmentId::new_v4(), 2, 5).is_err());
    }

    #[test]
    fn test_merge_and_unmerge() {
        let sp = SegmentedProfile::new(ramp(), chain(&[0, 3, 6], 10)).unwrap();
        let ids = sp.segment_ids();
        let merged_id = SegmentId::new_v4();

        // 参数顺序无关.
        let merged = sp.merge(ids[2], ids[1], merged_id).unwrap();
        assert_eq!(merged.segment_ids(), vec![ids[0], merged_id]);
        assert_eq!(starts(&merged), vec![0, 3]);
        assert_eq!(
            merged.merge_sources(merged_id).iter().map(Segment::id).collect::<Vec<_>>(),
            vec![ids[1], ids[2]]
        );
        assert_eq!(
            merged.segment_subregion(merged_id).unwrap().to_vec(),
            vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]
        );

        let restored = merged.unmerge(merged_id).unwrap();
        assert_eq!(restored, sp);
        assert!(sp.unmerge(ids[0]).is_err());
    }

    #[test]
    fn test_merge_across_zero() {
        let sp = SegmentedProfile::new(ramp(), chain(&[0, 3, 6], 10)).unwrap();
        let ids = sp.segment_ids();
        let merged_id = SegmentId::new_v4();
        let merged = sp.merge(ids[0], ids[2], merged_id).unwrap();
        assert_eq!(merged.segment_ids(), vec![ids[1], merged_id]);
        assert_eq!(merged.segment(merged_id).unwrap().start(), 6);
        assert_eq!(merged.segment(merged_id).unwrap().end(), 3);
        assert_eq!(merged.unmerge(merged_id).unwrap().segment_ids(), vec![ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_merge_err() {
        let sp = SegmentedProfile::new(ramp(), chain(&[0, 2, 5, 8], 10)).unwrap();
        let ids = sp.segment_ids();
        assert!(sp.merge(ids[0], ids[2], SegmentId::new_v4()).is_err());
        assert!(sp.merge(ids[0], ids[0], SegmentId::new_v4()).is_err());
        assert!(sp.merge(ids[0], ids[1], ids[3]).is_err());

        // 合并后移动端点, 来源分段无法还原.
        let merged_id = SegmentId::new_v4();
        let merged = sp.merge(ids[0], ids[1], merged_id).unwrap();
        let moved = merged.update(merged_id, 0, 6).unwrap();
        assert!(moved.unmerge(merged_id).is_err());
    }

    #[test]
    fn test_split() {
        let sp = SegmentedProfile::new(ramp(), chain(&[0, 6], 10)).unwrap();
        let ids = sp.segment_ids();
        let (a, b) = (SegmentId::new_v4(), SegmentId::new_v4());

        let split = sp.split(ids[1], 8, a, b).unwrap();
        assert_eq!(split.segment_ids(), vec![ids[0], a, b]);
        assert_eq!(starts(&split), vec![0, 6, 8]);
        assert_eq!(split.segment_subregion(b).unwrap().to_vec(), vec![8.0, 9.0]);

        assert!(sp.split(ids[1], 6, a, b).is_err());
        assert!(sp.split(ids[1], 3, a, b).is_err());
        assert!(sp.split(ids[1], 8, a, a).is_err());
        assert!(sp.split(ids[1], 8, ids[0], b).is_err());

        let whole = SegmentedProfile::new(ramp(), chain(&[3], 10)).unwrap();
        let halves = whole.split(whole.segment_ids()[0], 7, a, b).unwrap();
        assert_eq!(starts(&halves), vec![3, 7]);
        assert_eq!(halves.segments()[1].len(), 6);
    }

    #[test]
    fn test_reverse() {
        let sp = SegmentedProfile::new(ramp(), chain(&[0, 3, 6], 10)).unwrap();
        let ids = sp.segment_ids();
        let reversed = sp.reverse().unwrap();

        assert_eq!(reversed.profile(), &ramp().reverse());
        assert_eq!(reversed.segment_ids(), vec![ids[2], ids[1], ids[0]]);
        for id in ids {
            assert_eq!(
                reversed.segment_subregion(id).unwrap(),
                sp.segment_subregion(id).unwrap().reverse()
            );
        }
        assert_eq!(reversed.reverse().unwrap(), sp);
    }
}
