//! 实验结果.

use crate::stats::AlignStats;
use morph_berry::prelude::ProfileType;
use std::io::{self, Write};

/// 将 `stats` 的结果写进 `w` 中.
fn describe_into<W: Write>(ty: ProfileType, stats: &AlignStats, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn to_display<T: ToString>(v: Option<T>) -> String {
        v.map_or_else(|| "/".to_string(), |v| v.to_string())
    }

    writeln!(w, "Profile type `{ty}`:")?;
    writeln!(w, "{S4}Rounds: {}", stats.get_rounds())?;
    writeln!(w, "{S4}Located nuclei: {}", stats.get_located())?;
    writeln!(w, "{S4}Skipped nuclei: {}", stats.get_skipped())?;
    writeln!(
        w,
        "{S4}Population index: {}",
        to_display(stats.get_population_index())
    )?;
    writeln!(
        w,
        "{S4}Average error: {} points",
        to_display(stats.get_avg_error().map(|e| format!("{e:.4}")))
    )?;
    writeln!(w, "{S4}Max error: {} points", stats.get_max_error())?;
    writeln!(w, "{S4}Alignment total time: {} us", stats.get_align_time_us())?;
    writeln!(
        w,
        "{S4}Alignment average time: {} us per round",
        to_display(stats.get_avg_round_time_us().map(|t| format!("{t:.2}")))
    )?;
    writeln!(w, "{S4}Total machine time: {} us", stats.get_real_time_us())?;
    let t = stats.get_most_time_consuming().map(|d| d.as_micros() as u64);
    write!(w, "{S4}Most time-consuming round costs {} us", to_display(t))?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(ProfileType, AlignStats)>,
}

impl FromIterator<(ProfileType, AlignStats)> for AblationResult {
    fn from_iter<I: IntoIterator<Item = (ProfileType, AlignStats)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }
}

impl AblationResult {
    /// 分析运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        utils::sep_to(&mut out)?;
        for (ty, stats) in self.data.iter() {
            describe_into(*ty, stats, &mut out)?;
            writeln!(out)?;
            utils::sep_to(&mut out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::describe_into;
    use crate::stats::AlignStats;
    use morph_berry::prelude::ProfileType;

    #[test]
    fn test_describe_into() {
        let mut stats = AlignStats::new();
        stats.record_errors([Some(2), Some(0)]);
        stats.set_population_index(Some(75));
        let mut buf = Vec::new();
        describe_into(ProfileType::Radius, &stats, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Profile type `radius`:"));
        assert!(text.contains("Population index: 75"));
        assert!(text.contains("Average error: 1.0000 points"));
        assert!(text.contains("Most time-consuming round costs / us"));
    }
}
