//! 肺气肿定量.
//!
//! 给定 3D CT 扫描与肺分割标签, 在所有肺体素 (标签非零) 的 HU 值上计算:
//!
//! 1. 低衰减区比例 LAA950 / LAA910 / LAA856 (`HU <= 阈值`);
//! 2. 高衰减区比例 HAA700 / HAA600 / HAA500 / HAA250 (`HU >= 阈值`);
//! 3. 第 15 与第 10 百分位数;
//! 4. 均值、总体标准差、峰度 (Fisher, 偏差修正)、偏度 (偏差修正)、中位数、最小值、最大值.
//!
//! 分数要么全部存在, 要么全部缺失 (肺体素为空), 不存在部分结果.
//! 另外可以生成 LAA950 肺气肿掩码: 肺内且 `HU <= -950` 的体素为 1, 其余为 0.

use ndarray::{Array3, Zip};

use crate::consts::gray::{is_lung, LABEL_FOREGROUND};
use crate::consts::hu::{EMPHYSEMA_THRESHOLD, HAA_THRESHOLDS, LAA_THRESHOLDS};
use crate::data::{NiftiHeaderAttr, VolumeError};
use crate::{CtLabel, CtScan, Idx3d};

pub mod report;
pub mod stats;

use stats::SortedSample;

/// 肺气肿定量失败.
#[derive(Debug, thiserror::Error)]
pub enum EmphysemaError {
    /// 扫描与标签不在同一体素网格上.
    #[error(transparent)]
    Grid(#[from] VolumeError),

    /// 肺内存在无意义的 HU 值 (inf, NaN).
    #[error("non-finite intensity {value} at voxel {pos:?}")]
    NonFinite {
        /// 体素索引, `(z, h, w)`.
        pos: Idx3d,
        /// 读到的值.
        value: f32,
    },
}

/// 一次定量得到的全部 16 项分数.
///
/// 比例均为 `[0, 1]` 内的小数, 其余统计量以 HU 为单位 (峰度与偏度无量纲).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EmphysemaScores {
    /// `HU <= -950` 的肺体素比例.
    pub laa950: f64,
    /// `HU <= -910` 的肺体素比例.
    pub laa910: f64,
    /// `HU <= -856` 的肺体素比例.
    pub laa856: f64,
    /// `HU >= -700` 的肺体素比例.
    pub haa700: f64,
    /// `HU >= -600` 的肺体素比例.
    pub haa600: f64,
    /// `HU >= -500` 的肺体素比例.
    pub haa500: f64,
    /// `HU >= -250` 的肺体素比例.
    pub haa250: f64,
    /// 第 15 百分位数.
    pub perc15: f64,
    /// 第 10 百分位数.
    pub perc10: f64,
    /// 均值.
    pub hu_mean: f64,
    /// 总体标准差.
    pub hu_std: f64,
    /// Fisher 峰度.
    pub hu_kurtosis: f64,
    /// 偏度.
    pub hu_skewness: f64,
    /// 中位数.
    pub hu_median: f64,
    /// 最小值.
    pub hu_min: f64,
    /// 最大值.
    pub hu_max: f64,
}

impl EmphysemaScores {
    /// 各项分数的列名, 顺序与 [`Self::as_row`] 一致.
    pub const COLUMNS: [&'static str; 16] = [
        "LAA950",
        "LAA910",
        "LAA856",
        "HAA700",
        "HAA600",
        "HAA500",
        "HAA250",
        "Perc15",
        "Perc10",
        "HUMean",
        "HUStd",
        "HUKurtosis",
        "HUSkewness",
        "HUMedian",
        "HUMin",
        "HUMax",
    ];

    /// 由肺体素 HU 值计算分数. `values` 为空时返回 `None`.
    pub fn from_lung_values(values: Vec<f64>) -> Option<Self> {
        let sample = SortedSample::new(values)?;
        let moments = sample.moments();
        let [laa950, laa910, laa856] = LAA_THRESHOLDS.map(|t| sample.fraction_at_or_below(t));
        let [haa700, haa600, haa500, haa250] =
            HAA_THRESHOLDS.map(|t| sample.fraction_at_or_above(t));

        Some(Self {
            laa950,
            laa910,
            laa856,
            haa700,
            haa600,
            haa500,
            haa250,
            perc15: sample.percentile(15.0),
            perc10: sample.percentile(10.0),
            hu_mean: moments.mean(),
            hu_std: moments.std(),
            hu_kurtosis: moments.kurtosis(),
            hu_skewness: moments.skewness(),
            hu_median: sample.median(),
            hu_min: sample.min(),
            hu_max: sample.max(),
        })
    }

    /// 按 [`Self::COLUMNS`] 的顺序排列的分数.
    pub fn as_row(&self) -> [f64; 16] {
        [
            self.laa950,
            self.laa910,
            self.laa856,
            self.haa700,
            self.haa600,
            self.haa500,
            self.haa250,
            self.perc15,
            self.perc10,
            self.hu_mean,
            self.hu_std,
            self.hu_kurtosis,
            self.hu_skewness,
            self.hu_median,
            self.hu_min,
            self.hu_max,
        ]
    }
}

/// 检查 `scan` 与 `label` 是否处于同一体素网格.
fn check_grid(scan: &CtScan, label: &CtLabel) -> Result<(), VolumeError> {
    if label.same_grid(scan) {
        Ok(())
    } else {
        Err(VolumeError::ShapeMismatch {
            expected: scan.shape(),
            found: label.shape(),
        })
    }
}

/// 收集所有肺体素 (标签非零) 的 HU 值, 按行优先序.
pub fn lung_values(scan: &CtScan, label: &CtLabel) -> Result<Vec<f64>, EmphysemaError> {
    check_grid(scan, label)?;
    let mut values = Vec::with_capacity(label.count_nonzero());
    for ((pos, &hu), &l) in scan.data().indexed_iter().zip(label.data().iter()) {
        if !is_lung(l) {
            continue;
        }
        if !hu.is_finite() {
            return Err(EmphysemaError::NonFinite { pos, value: hu });
        }
        values.push(hu as f64);
    }
    Ok(values)
}

/// 计算肺气肿分数.
///
/// - 标签中没有肺体素时返回 `Ok(None)`: 这是正常结果, 但调用方应将其视为不完整;
/// - 扫描与标签形状不一致, 或肺内含有非有限值时返回 `Err`.
pub fn quantify(scan: &CtScan, label: &CtLabel) -> Result<Option<EmphysemaScores>, EmphysemaError> {
    Ok(EmphysemaScores::from_lung_values(lung_values(scan, label)?))
}

/// 构造阈值掩码: 肺内且 `HU <= threshold` 的体素为 1, 其余为 0.
///
/// 掩码与 `scan` 处于同一体素网格并拷贝其空间元信息.
pub fn laa_mask(scan: &CtScan, label: &CtLabel, threshold: f64) -> Result<CtLabel, EmphysemaError> {
    check_grid(scan, label)?;
    let mut mask = Array3::<u8>::zeros(scan.shape());
    Zip::from(&mut mask)
        .and(scan.data())
        .and(label.data())
        .for_each(|m, &hu, &l| {
            if is_lung(l) && (hu as f64) <= threshold {
                *m = LABEL_FOREGROUND;
            }
        });
    Ok(CtLabel::from_scan_grid(scan, mask)?)
}

/// 完整的肺气肿分析结果: 分数与 LAA950 掩码.
#[derive(Debug, Clone)]
pub struct EmphysemaAnalysis {
    /// 16 项分数.
    pub scores: EmphysemaScores,

    /// LAA950 肺气肿掩码.
    pub mask: CtLabel,
}

/// 同时计算分数与 LAA950 掩码. 二者要么同时存在, 要么同时缺失.
pub fn analyze(scan: &CtScan, label: &CtLabel) -> Result<Option<EmphysemaAnalysis>, EmphysemaError> {
    let Some(scores) = quantify(scan, label)? else {
        return Ok(None);
    };
    let mask = laa_mask(scan, label, EMPHYSEMA_THRESHOLD)?;
    Ok(Some(EmphysemaAnalysis { scores, mask }))
}
