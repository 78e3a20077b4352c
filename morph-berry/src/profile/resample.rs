//! 环形线性重采样.

use super::Profile;
use crate::error::{ProfileError, ProfileResult};
use ndarray::{Array1, ArrayView1};

impl Profile {
    /// 重采样到长度 `new_len`. 允许降采样.
    ///
    /// 新索引 `i` 对应旧位置 `i * N / new_len`, 在相邻两个旧值之间线性插值,
    /// 最后一个旧值与第一个旧值相邻. 当 `new_len == N` 时结果与原 profile 完全相同.
    pub fn interpolate(&self, new_len: usize) -> ProfileResult<Profile> {
        if new_len == 0 {
            return Err(ProfileError::invalid("interpolation length cannot be zero"));
        }
        Ok(Self::from_array_unchecked(interpolate_values(
            self.view(),
            new_len,
        )))
    }
}

/// 把非空的 `values` 环形线性重采样到 `new_len` (非零) 个点.
///
/// 旧位置用整数 `i * N` 除以 `new_len` 的商与余数表示, 余数为 0 时直接取旧值.
pub(crate) fn interpolate_values(values: ArrayView1<'_, f64>, new_len: usize) -> Array1<f64> {
    let old_len = values.len();
    Array1::from_shape_fn(new_len, |i| {
        let scaled = i * old_len;
        let lower = scaled / new_len;
        let remainder = scaled % new_len;
        if remainder == 0 {
            return values[lower];
        }
        let higher = if lower + 1 == old_len { 0 } else { lower + 1 };
        let fraction = remainder as f64 / new_len as f64;
        values[lower] + (values[higher] - values[lower]) * fraction
    })
}

/// 索引从长度 `from` 换算到长度 `to` (四舍五入, 环形). `from` 与 `to` 都不能为 0.
pub(crate) fn project_index(index: usize, from: usize, to: usize) -> usize {
    ((2 * index * to + from) / (2 * from)) % to
}

#[cfg(test)]
mod tests {
    use super::super::tests::{f64_eq, hexagon};
    use super::project_index;
    use crate::profile::Profile;

    #[test]
    fn test_project_index() {
        assert_eq!(project_index(12, 100, 100), 12);
        assert_eq!(project_index(12, 100, 50), 6);
        assert_eq!(project_index(99, 100, 50), 0);
        assert_eq!(project_index(5, 10, 3), 2);
        assert_eq!(project_index(30, 60, 90), 45);
    }

    #[test]
    fn test_interpolate_identity() {
        let p = Profile::new((0..37).map(|i| (i as f64 * 1.3).cos() * 7.0).collect()).unwrap();
        assert_eq!(p.interpolate(p.len()).unwrap(), p);
        assert!(p.interpolate(0).is_err());
    }

    #[test]
    fn test_interpolate_up() {
        let p = hexagon().interpolate(12).unwrap();
        assert_eq!(p.len(), 12);
        assert!(f64_eq(p.get(0).unwrap(), 0.0));
        assert!(f64_eq(p.get(1).unwrap(), 5.0));
        assert!(f64_eq(p.get(6).unwrap(), 30.0));
        // 最后一个点在旧的最后一个值与第一个值之间.
        assert!(f64_eq(p.get(11).unwrap(), 5.0));
    }

    #[test]
    fn test_interpolate_down() {
        let p = hexagon().interpolate(3).unwrap();
        assert_eq!(p.to_vec(), vec![0.0, 20.0, 20.0]);

        let single = Profile::new(vec![2.0]).unwrap().interpolate(4).unwrap();
        assert_eq!(single.to_vec(), vec![2.0; 4]);
    }
}
