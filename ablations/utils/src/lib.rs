//! 消融实验依赖的通用组件.

use morph_berry::prelude::*;
use std::f64::consts::TAU;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 合成细胞核上尖端 (tip) 所在的弧长比例.
pub const TIP_FRACTION: f64 = 0.25;

/// 合成细胞核的尖端标签.
pub fn tip() -> Tag {
    Tag::Movable(MovableTag::Custom("tip".to_owned()))
}

#[inline]
fn bump(x: f64, width: f64) -> f64 {
    // 环形距离.
    let d = (x - TIP_FRACTION).rem_euclid(1.0);
    let d = d.min(1.0 - d);
    (-(d / width).powi(2)).exp()
}

/// 合成角度 profile 的形状: 一个缓慢起伏的轮廓, 在 [`TIP_FRACTION`] 处有一个尖端.
#[inline]
pub fn angle_shape(x: f64) -> f64 {
    180.0 + 30.0 * (x * TAU).sin() + 70.0 * bump(x, 0.04)
}

/// 合成半径 profile 的形状.
#[inline]
pub fn radius_shape(x: f64) -> f64 {
    1.0 + 0.2 * (x * TAU).cos() + 0.3 * bump(x, 0.05)
}

/// 合成第 `k` 个细胞核. 轮廓点数为 `len`, Reference 相对形状起点偏移 `shift` 个点.
///
/// 尖端在该细胞核上的真实索引为 [`true_tip_index`].
pub fn synthetic_nucleus(k: usize, len: usize, shift: usize) -> ProfileResult<Nucleus> {
    let noise = |i: usize| 1.5 * ((i * 37 + k * 11) as f64).sin();
    let at = |i: usize| (i + shift) as f64 / len as f64;

    let angle = Profile::new((0..len).map(|i| angle_shape(at(i)) + noise(i)).collect())?;
    let radius = Profile::new((0..len).map(|i| radius_shape(at(i))).collect())?;
    let diameter = Profile::new(
        (0..len)
            .map(|i| radius_shape(at(i)) + radius_shape(at(i) + 0.5))
            .collect(),
    )?;
    Nucleus::new(angle)
        .with_profile(ProfileType::Radius, radius)?
        .with_profile(ProfileType::Diameter, diameter)
}

/// 合成细胞核上尖端的真实索引.
pub fn true_tip_index(len: usize, shift: usize) -> usize {
    let index = (TIP_FRACTION * len as f64).round() as isize - shift as isize;
    index.rem_euclid(len as isize) as usize
}

/// 两个索引在长度为 `len` 的环上的距离.
pub fn circular_distance(a: usize, b: usize, len: usize) -> usize {
    let d = a.abs_diff(b) % len;
    d.min(len - d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_tip_index() {
        assert_eq!(true_tip_index(100, 0), 25);
        assert_eq!(true_tip_index(100, 30), 95);
        let nucleus = synthetic_nucleus(0, 100, 30).unwrap();
        let angle = nucleus.profile(ProfileType::Angle, &Tag::Reference).unwrap();
        assert!(circular_distance(angle.index_of_max(), 95, 100) <= 1);
    }

    #[test]
    fn test_circular_distance() {
        assert_eq!(circular_distance(1, 99, 100), 2);
        assert_eq!(circular_distance(40, 10, 100), 30);
    }

    #[test]
    fn test_sep_to() {
        let mut buf = Vec::new();
        sep_to(&mut buf).unwrap();
        assert_eq!(buf, format!("{SEP}\n").into_bytes());
    }
}
