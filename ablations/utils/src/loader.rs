//! 实验配置与合成数据加载器.

use crate::synthetic_nucleus;
use morph_berry::prelude::*;
use std::env;
use std::str::FromStr;

/// 读取环境变量 `key` 并解析. 未设置或无法解析时返回 `default`.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 一次消融实验的配置.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// 细胞核个数.
    pub nuclei: usize,
    /// 轮廓点数的基准值. 每个细胞核在其上下浮动至多 10%.
    pub length: usize,
    /// 每种 profile 类型重复定位的次数.
    pub repeats: usize,
}

impl RunConfig {
    /// 从环境变量读取配置.
    ///
    /// 1. `$ALIGN_NUCLEI`, 默认 200;
    /// 2. `$ALIGN_LENGTH`, 默认 300;
    /// 3. `$ALIGN_REPEATS`, 默认 5.
    ///
    /// 每一项至少为 1.
    pub fn from_env_or_default() -> Self {
        Self {
            nuclei: env_or("ALIGN_NUCLEI", 200).max(1),
            length: env_or("ALIGN_LENGTH", 300).max(10),
            repeats: env_or("ALIGN_REPEATS", 5).max(1),
        }
    }

    /// 第 `k` 个细胞核的轮廓点数与 Reference 偏移.
    pub fn layout(&self, k: usize) -> (usize, usize) {
        let spread = self.length / 10;
        let len = self.length - spread + (k * 7) % (2 * spread + 1);
        let shift = (k * 13) % (len / 8).max(1);
        (len, shift)
    }

    /// 按配置合成细胞核群体.
    pub fn population(&self) -> ProfileResult<CellPopulation> {
        (0..self.nuclei)
            .map(|k| {
                let (len, shift) = self.layout(k);
                synthetic_nucleus(k, len, shift)
            })
            .collect::<ProfileResult<Vec<_>>>()
            .map(CellPopulation::new)
    }
}

#[cfg(test)]
mod tests {
    use super::RunConfig;
    use morph_berry::prelude::*;

    #[test]
    fn test_population_layout() {
        let config = RunConfig {
            nuclei: 20,
            length: 100,
            repeats: 1,
        };
        let population = config.population().unwrap();
        assert_eq!(population.len(), 20);
        for (k, nucleus) in population.nuclei().iter().enumerate() {
            let (len, shift) = config.layout(k);
            assert_eq!(nucleus.boundary_len(), len);
            assert!((90..=110).contains(&len));
            assert!(shift < len / 8);
        }
    }
}
