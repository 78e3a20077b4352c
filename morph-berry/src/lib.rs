#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 把细胞核的闭合轮廓表示为环形 profile, 并在群体层面进行对齐, 聚合与分段.
//!
//! 图像采集, 阈值分割, 边缘检测等上游步骤不在本 crate 范围内.
//! 上游只需要实现 [`Profileable`] 与 [`Population`] 两个 trait.
//!
//! 该 crate 仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 所有可预期的失败 (索引越界, 长度不一致, 标签不存在等) 都以 [`ProfileResult`] 返回,
//!   不会 panic.
//! 2. profile 是值对象. 任何变换都返回新的 profile.
//! 3. 查询接口只需要 `&self`, 可以在多个线程中同时调用; 修改接口需要 `&mut self`.
//!
//! # 开发计划
//!
//! ### 环形 profile 与基础运算 ✅
//!
//! 旋转, 平滑, 差分, 重采样, 局部极值, 逐点算术与统计量.
//!
//! 实现位于 `morph-berry/src/profile`.
//!
//! ### 旋转对齐 ✅
//!
//! 差的平方和 (含直线边界加权版本), 以及穷举全部旋转的滑动窗口对齐.
//! 打开 `rayon` feature 时并行计算.
//!
//! 实现位于 `morph-berry/src/profile/align.rs`.
//!
//! ### 标签与分段 ✅
//!
//! 1. Reference 标签在类型层面固定于索引 0. ✅
//! 2. 分段链的校验, 平移与持久化重建. ✅
//! 3. 分段通过 UUID 追踪身份. ✅
//!
//! 实现位于 `morph-berry/src/tag.rs` 与 `morph-berry/src/segment`.
//!
//! ### 群体聚合与集合 ✅
//!
//! 逐点分位数, 四分位距, 可变区域搜索, 带版本号的查询缓存.
//!
//! 实现位于 `morph-berry/src/aggregate.rs` 与 `morph-berry/src/collection`.
//!
//! ### 细胞核标签定位 ✅
//!
//! 带进度事件与协作式取消.
//!
//! 实现位于 `morph-berry/src/landmark.rs`.
//!
//! ### 局部极值的噪声容忍 ⌛️
//!
//! 目前的极值判断是严格单调的, 平台上的点不会被识别.

pub mod consts;

mod error;

pub use error::{ProfileError, ProfileResult};

pub mod config;

pub mod profile;

pub mod tag;

pub mod segment;

mod aggregate;

pub use aggregate::ProfileAggregate;

pub mod collection;

pub mod nucleus;

pub use nucleus::{Population, Profileable};

pub mod landmark;

pub mod prelude;
