//! 在每个细胞核上定位群体标签.
//!
//! 群体中位数 profile 以 `tag` 为起点时, 每个细胞核以 Reference 为起点的 profile
//! 需要旋转多少才能与之最吻合, 这个旋转量就是该细胞核上 `tag` 的索引.

use crate::aggregate::percentile;
use crate::collection::ProfileCollection;
use crate::consts::quartile::MEDIAN;
use crate::error::{ProfileError, ProfileResult};
use crate::nucleus::{CellPopulation, Population, ProfileType, Profileable};
use crate::profile::{project_index, wrap_index};
use crate::tag::Tag;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

/// 定位进度事件.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// 又处理完一个细胞核.
    NucleusDone {
        /// 已处理个数.
        done: usize,
        /// 总个数.
        total: usize,
    },
}

/// 协作式取消标记. 定位过程在两个细胞核之间检查它.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    /// 未取消的标记.
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// 是否已请求取消?
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// 定位结果.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LandmarkFit {
    tag: Tag,
    per_nucleus: Vec<Option<usize>>,
    population_index: Option<usize>,
    cancelled: bool,
}

impl LandmarkFit {
    /// 被定位的标签.
    #[inline]
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// 每个已处理细胞核上的索引 (以该细胞核自身长度计). 被跳过的细胞核为 `None`.
    #[inline]
    pub fn per_nucleus(&self) -> &[Option<usize>] {
        &self.per_nucleus
    }

    /// 群体索引: 各细胞核索引换算到集合长度后的环形中位数.
    #[inline]
    pub fn population_index(&self) -> Option<usize> {
        self.population_index
    }

    /// 是否因取消而提前结束?
    #[inline]
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// 把群体索引写入 `collection`, 把每个细胞核的索引写入 `population`.
    ///
    /// 提前取消时只更新已处理的细胞核.
    pub fn apply(&self, collection: &mut ProfileCollection, population: &mut CellPopulation) -> ProfileResult<()> {
        if let Some(index) = self.population_index {
            collection.add_index(&self.tag, index)?;
        }
        for (nucleus, index) in population.nuclei_mut().iter_mut().zip(&self.per_nucleus) {
            if let Some(index) = *index {
                nucleus.set_tag(&self.tag, index)?;
            }
        }
        Ok(())
    }
}

/// `index` 相对 `base` 的环形有符号偏移, 落在 `(-N/2, N/2]` 内.
fn signed_offset(index: usize, base: usize, len: usize) -> isize {
    let d = wrap_index(index as isize - base as isize, len) as isize;
    if 2 * d > len as isize {
        d - len as isize
    } else {
        d
    }
}

/// 环上索引的中位数.
///
/// 先把每个索引展开为相对 `base` 的有符号偏移, 取偏移的中位数后再加回 `base`,
/// 使跨过索引 0 的一簇索引不会被拉到环的另一侧.
fn circular_median(indices: &[usize], base: usize, len: usize) -> Option<usize> {
    let offsets = indices.iter().map(|&i| signed_offset(i, base, len) as f64);
    percentile(offsets, MEDIAN).map(|m| wrap_index(base as isize + m.round() as isize, len))
}

/// 在 `population` 的每个细胞核上定位 `tag`.
///
/// 目标是 `collection` 中以 `tag` 为起点的 `ty` 类型中位数 profile.
/// 无法提供 profile 的细胞核被跳过并记录警告. 每处理完一个细胞核调用一次 `on_progress`.
pub fn locate_landmark<P, F>(
    population: &P,
    collection: &ProfileCollection,
    ty: ProfileType,
    tag: &Tag,
    cancel: &CancelFlag,
    mut on_progress: F,
) -> ProfileResult<LandmarkFit>
where
    P: Population,
    F: FnMut(Progress),
{
    let target = collection.profile(ty, tag, MEDIAN)?;
    let base = collection.index_of(tag)?;
    let length = collection.length();
    if length == 0 {
        return Err(ProfileError::invalid("collection has no aggregate length"));
    }

    let total = population.len();
    let mut per_nucleus = Vec::with_capacity(total);
    let mut projected = Vec::with_capacity(total);
    let mut cancelled = false;
    for (k, nucleus) in population.nuclei().iter().enumerate() {
        if cancel.is_cancelled() {
            info!("locating {tag} cancelled after {k} of {total} nuclei");
            cancelled = true;
            break;
        }
        let index = match nucleus.profile(ty, &Tag::Reference) {
            Ok(own) => {
                let index = own.sliding_window_offset(&target);
                projected.push(project_index(index, own.len(), length));
                Some(index)
            }
            Err(e) => {
                warn!("nucleus {k} skipped while locating {tag}: {e}");
                None
            }
        };
        per_nucleus.push(index);
        on_progress(Progress::NucleusDone { done: k + 1, total });
    }

    let population_index = circular_median(&projected, base, length);
    Ok(LandmarkFit {
        tag: tag.clone(),
        per_nucleus,
        population_index,
        cancelled,
    })
}
