//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{ProfileAggregate, ProfileError, ProfileResult};

pub use crate::profile::{BooleanProfile, Profile};

pub use crate::tag::{MovableTag, Tag, TagIndexes};

pub use crate::segment::{Segment, SegmentId, SegmentedProfile};

pub use crate::collection::{CollectionRecord, ProfileCollection};

pub use crate::nucleus::{CellPopulation, Nucleus, Population, ProfileType, Profileable};

pub use crate::landmark::{locate_landmark, CancelFlag, LandmarkFit, Progress};

pub use crate::config::VariableRegionSpec;

pub use crate::consts::quartile::{LOWER_QUARTILE, MEDIAN, UPPER_QUARTILE};
