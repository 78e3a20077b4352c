//! 集合的持久化记录.
//!
//! 只保存长度, 标签与分段; 聚合不保存, 恢复后用
//! [`ProfileCollection::create_and_restore_profile_aggregate`] 重新建立.

use super::ProfileCollection;
use crate::error::{ProfileError, ProfileResult};
use crate::segment::{from_starts, Segment, SegmentId};
use crate::tag::Tag;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [`ProfileCollection`] 的持久化形式.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionRecord {
    /// 聚合的共同长度.
    pub length: usize,
    /// `(标签名, 索引)`, 包括 Reference.
    pub tags: Vec<(String, usize)>,
    /// 按链的顺序保存 `(分段身份, 起点)`.
    pub segments: Vec<(SegmentId, usize)>,
}

#[cfg(feature = "serde")]
impl CollectionRecord {
    /// 使用 bincode 编码.
    pub fn to_bytes(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    /// 使用 bincode 解码.
    pub fn from_bytes(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}

impl ProfileCollection {
    /// 导出持久化记录.
    pub fn to_record(&self) -> CollectionRecord {
        CollectionRecord {
            length: self.length,
            tags: self
                .tags
                .iter()
                .map(|(tag, index)| (tag.to_string(), index))
                .collect(),
            segments: self
                .segments
                .iter()
                .flatten()
                .map(|s: &Segment| (s.id(), s.start()))
                .collect(),
        }
    }

    /// 从持久化记录恢复. 恢复出的集合没有聚合.
    ///
    /// 记录了共同长度时, 标签索引必须小于它, 否则返回 `OutOfRange`.
    pub fn from_record(record: &CollectionRecord) -> ProfileResult<Self> {
        let mut collection = Self {
            length: record.length,
            ..Self::default()
        };
        for (name, index) in &record.tags {
            let tag: Tag = name.parse()?;
            if record.length != 0 && *index >= record.length {
                return Err(ProfileError::OutOfRange {
                    index: *index,
                    len: record.length,
                });
            }
            collection.tags.assign(&tag, *index);
        }
        if !record.segments.is_empty() {
            collection.segments = Some(from_starts(&record.segments, record.length)?);
        }
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use crate::collection::ProfileCollection;
    use crate::error::ProfileError;
    use crate::nucleus::{CellPopulation, Nucleus, ProfileType};
    use crate::profile::Profile;
    use crate::segment::tests::chain;
    use crate::tag::Tag;

    fn collection() -> (ProfileCollection, CellPopulation) {
        let population: CellPopulation = (0..3)
            .map(|k| {
                let values = (0..40).map(|i| 180.0 + ((i + k) % 7) as f64).collect();
                Nucleus::new(Profile::new(values).unwrap())
            })
            .collect();
        let mut c = ProfileCollection::new();
        c.create_profile_aggregate(&population, 40).unwrap();
        c.add_index(&Tag::named("tip").unwrap(), 12).unwrap();
        c.add_index(&Tag::ORIENTATION, 30).unwrap();
        c.add_segments(chain(&[0, 10, 25], 40)).unwrap();
        (c, population)
    }

    #[test]
    fn test_record_round_trip() {
        let (c, population) = collection();
        let record = c.to_record();
        assert_eq!(record.tags.len(), 3);
        assert_eq!(record.segments.len(), 3);

        let mut restored = ProfileCollection::from_record(&record).unwrap();
        assert_eq!(restored.length(), 40);
        assert!(!restored.has_aggregate());
        assert_eq!(restored.tags(), c.tags());
        assert_eq!(restored.segment_ids(), c.segment_ids());
        assert_eq!(
            restored.segments(&Tag::Reference).unwrap(),
            c.segments(&Tag::Reference).unwrap()
        );
        assert_eq!(restored.to_record(), record);

        restored.create_and_restore_profile_aggregate(&population).unwrap();
        assert!(restored.has_segments());
        assert_eq!(
            restored.profile(ProfileType::Angle, &Tag::ORIENTATION, 50.0),
            c.profile(ProfileType::Angle, &Tag::ORIENTATION, 50.0)
        );
    }

    #[test]
    fn test_record_rejects_bad_chain() {
        let (c, _) = collection();
        let mut record = c.to_record();
        record.length = 0;
        assert!(ProfileCollection::from_record(&record).is_err());

        let mut record = c.to_record();
        record.tags.push((String::new(), 3));
        assert!(ProfileCollection::from_record(&record).is_err());
    }

    #[test]
    fn test_record_rejects_tag_out_of_range() {
        let (c, _) = collection();
        let mut record = c.to_record();
        record.tags.push(("bottom-vertical".to_string(), 40));
        assert_eq!(
            ProfileCollection::from_record(&record).err(),
            Some(ProfileError::OutOfRange { index: 40, len: 40 })
        );

        // 恢复后的集合同样限制标签索引.
        let mut restored = ProfileCollection::from_record(&c.to_record()).unwrap();
        assert!(restored.add_index(&Tag::BOTTOM_VERTICAL, 40).is_err());
        restored.add_index(&Tag::BOTTOM_VERTICAL, 39).unwrap();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_record_bytes() {
        use super::CollectionRecord;

        let (c, _) = collection();
        let record = c.to_record();
        let bytes = record.to_bytes().unwrap();
        assert_eq!(CollectionRecord::from_bytes(&bytes).unwrap(), record);
    }
}
