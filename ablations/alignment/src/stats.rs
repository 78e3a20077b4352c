//! 定位运行统计.

use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时 (`self.start()`).
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    #[inline]
    fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 某一种 profile 类型的定位统计.
#[derive(Clone, Debug)]
pub struct AlignStats {
    /// 完成的定位轮数.
    rounds: u64,

    /// 最后一轮中成功定位的细胞核个数.
    located: u64,

    /// 最后一轮中被跳过的细胞核个数.
    skipped: u64,

    /// 定位花费的总时间.
    align_time: AccTimer,

    /// 整个任务花费的总时间 (包括合成数据与建立聚合).
    real_time: AccTimer,

    /// 最耗时的一轮.
    most: Option<Duration>,

    /// 定位索引与真实索引的环形距离之和.
    error_sum: u64,

    /// 最大环形距离.
    error_max: usize,

    /// 群体索引.
    population_index: Option<usize>,
}

impl AlignStats {
    /// 初始化.
    pub fn new() -> Self {
        Self {
            rounds: 0,
            located: 0,
            skipped: 0,
            align_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: None,
            error_sum: 0,
            error_max: 0,
            population_index: None,
        }
    }

    /// 开始一轮定位计时.
    #[inline]
    pub fn round_start(&mut self) {
        self.align_time.start();
    }

    /// 结束一轮定位计时.
    pub fn round_elapsed(&mut self) {
        let d = self.align_time.elapsed();
        self.rounds += 1;
        self.most = Some(self.most.map_or(d, |most| most.max(d)));
    }

    /// 记录最后一轮的定位误差. `errors` 中 `None` 表示该细胞核被跳过.
    pub fn record_errors<I: IntoIterator<Item = Option<usize>>>(&mut self, errors: I) {
        self.located = 0;
        self.skipped = 0;
        self.error_sum = 0;
        self.error_max = 0;
        for e in errors {
            match e {
                Some(e) => {
                    self.located += 1;
                    self.error_sum += e as u64;
                    self.error_max = self.error_max.max(e);
                }
                None => self.skipped += 1,
            }
        }
    }

    /// 记录群体索引.
    #[inline]
    pub fn set_population_index(&mut self, index: Option<usize>) {
        self.population_index = index;
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 完成的定位轮数.
    #[inline]
    pub fn get_rounds(&self) -> u64 {
        self.rounds
    }

    /// 成功定位的细胞核个数.
    #[inline]
    pub fn get_located(&self) -> u64 {
        self.located
    }

    /// 被跳过的细胞核个数.
    #[inline]
    pub fn get_skipped(&self) -> u64 {
        self.skipped
    }

    /// 以微秒为单位获得定位的总时间.
    #[inline]
    pub fn get_align_time_us(&self) -> u64 {
        self.align_time.total_us()
    }

    /// 以微秒为单位获得任务的总时间.
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.total_us()
    }

    /// 以微秒为单位获得每轮定位的平均时间.
    pub fn get_avg_round_time_us(&self) -> Option<f64> {
        match self.rounds {
            0 => None,
            rounds => Some(self.get_align_time_us() as f64 / rounds as f64),
        }
    }

    /// 平均定位误差 (点数).
    pub fn get_avg_error(&self) -> Option<f64> {
        match self.located {
            0 => None,
            located => Some(self.error_sum as f64 / located as f64),
        }
    }

    /// 最大定位误差 (点数).
    #[inline]
    pub fn get_max_error(&self) -> usize {
        self.error_max
    }

    /// 最耗时的一轮.
    #[inline]
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        self.most
    }

    /// 群体索引.
    #[inline]
    pub fn get_population_index(&self) -> Option<usize> {
        self.population_index
    }
}

impl Default for AlignStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::AlignStats;

    #[test]
    fn test_record_errors() {
        let mut stats = AlignStats::new();
        assert_eq!(stats.get_avg_error(), None);
        stats.record_errors([Some(1), None, Some(3)]);
        assert_eq!(stats.get_located(), 2);
        assert_eq!(stats.get_skipped(), 1);
        assert_eq!(stats.get_avg_error(), Some(2.0));
        assert_eq!(stats.get_max_error(), 3);

        stats.round_start();
        stats.round_elapsed();
        assert_eq!(stats.get_rounds(), 1);
        assert!(stats.get_most_time_consuming().is_some());
    }
}
