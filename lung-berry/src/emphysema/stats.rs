//! 一维样本的描述统计量.
//!
//! 约定与 numpy / scipy 的默认行为一致:
//!
//! - 分位数采用最近两个秩之间的线性插值;
//! - 标准差为总体标准差 (除以 `n`);
//! - 偏度与峰度为偏差修正 (`bias=False`) 版本, 峰度采用 Fisher 定义 (正态分布为 0).
//!   样本数过少 (偏度 `n <= 2`, 峰度 `n <= 3`) 时退回未修正值;
//!   样本在数值上为常数时二者均为 `NaN`.

use ordered_float::OrderedFloat;

/// 判断二阶中心矩是否在数值上为零时使用的相对精度.
const ZERO_RESOLUTION: f64 = 1e-14;

/// 已升序排列的非空样本.
#[derive(Clone, Debug)]
pub struct SortedSample(Vec<f64>);

impl SortedSample {
    /// 排序 `values`. 样本为空时返回 `None`.
    ///
    /// `values` 中不应含有 `NaN`, 否则分位数无意义.
    pub fn new(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_unstable_by_key(|v| OrderedFloat(*v));
        Some(Self(values))
    }

    /// 样本个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 总是 `false`, 构造时已保证非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 最小值.
    #[inline]
    pub fn min(&self) -> f64 {
        self.0[0]
    }

    /// 最大值.
    #[inline]
    pub fn max(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// 第 `q` 百分位数 (`0 <= q <= 100`), 线性插值.
    pub fn percentile(&self, q: f64) -> f64 {
        debug_assert!((0.0..=100.0).contains(&q));
        let v = &self.0;
        let rank = q / 100.0 * (v.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let frac = rank - lo as f64;
        v[lo] + (v[hi] - v[lo]) * frac
    }

    /// 中位数. 偶数个样本时取中间两数的平均值.
    #[inline]
    pub fn median(&self) -> f64 {
        self.percentile(50.0)
    }

    /// 样本中 `<= threshold` 的比例.
    pub fn fraction_at_or_below(&self, threshold: f64) -> f64 {
        let count = self.0.partition_point(|v| *v <= threshold);
        count as f64 / self.len() as f64
    }

    /// 样本中 `>= threshold` 的比例.
    pub fn fraction_at_or_above(&self, threshold: f64) -> f64 {
        let count = self.len() - self.0.partition_point(|v| *v < threshold);
        count as f64 / self.len() as f64
    }

    /// 均值与二至四阶中心矩.
    #[inline]
    pub fn moments(&self) -> Moments {
        Moments::of(&self.0)
    }
}

/// 均值与总体 (除以 `n`) 中心矩.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Moments {
    n: usize,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl Moments {
    /// 两遍扫描计算. `values` 必须非空.
    pub fn of(values: &[f64]) -> Self {
        debug_assert!(!values.is_empty());
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;

        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        let nf = n as f64;
        Self {
            n,
            mean,
            m2: m2 / nf,
            m3: m3 / nf,
            m4: m4 / nf,
        }
    }

    /// 算术平均值.
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// 总体方差.
    #[inline]
    pub fn variance(&self) -> f64 {
        self.m2
    }

    /// 总体标准差.
    #[inline]
    pub fn std(&self) -> f64 {
        self.m2.sqrt()
    }

    /// 样本是否在数值上为常数.
    #[inline]
    fn is_degenerate(&self) -> bool {
        self.m2 <= (ZERO_RESOLUTION * self.mean).powi(2)
    }

    /// 偏差修正后的偏度.
    pub fn skewness(&self) -> f64 {
        if self.is_degenerate() {
            return f64::NAN;
        }
        let g1 = self.m3 / self.m2.powf(1.5);
        if self.n <= 2 {
            return g1;
        }
        let n = self.n as f64;
        ((n - 1.0) * n).sqrt() / (n - 2.0) * g1
    }

    /// 偏差修正后的 Fisher 峰度 (超额峰度).
    pub fn kurtosis(&self) -> f64 {
        if self.is_degenerate() {
            return f64::NAN;
        }
        let g2 = self.m4 / (self.m2 * self.m2);
        if self.n <= 3 {
            return g2 - 3.0;
        }
        let n = self.n as f64;
        1.0 / (n - 2.0) / (n - 3.0) * ((n * n - 1.0) * g2 - 3.0 * (n - 1.0).powi(2))
    }
}
