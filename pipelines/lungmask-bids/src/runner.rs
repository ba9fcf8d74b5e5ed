//! 批处理主循环.
//!
//! 每个输入依次经历: BIDS 解析 → 分割并保存掩码 → (可选) 肺气肿定量.
//! 任一阶段失败只影响当前输入. 分割阶段失败的输入不写入结果表,
//! 定量阶段失败的输入以 `fail` 状态写入结果表.

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use lung_berry::bids::BidsOutputs;
use lung_berry::emphysema::{self, report, EmphysemaAnalysis, EmphysemaScores};
use lung_berry::segment::{SegmentError, Segmenter};
use lung_berry::{CtLabel, CtScan, NiftiSave};
use tracing::{error, info};

use crate::config::RunConfig;
use crate::result::{ResultRow, ResultsTable, Status};

/// 单次运行的上下文: 配置与运行期间保持打开的结果表.
pub struct RunContext {
    config: RunConfig,
    results: Option<ResultsTable>,
}

impl RunContext {
    /// 创建输出根目录; 若需要肺气肿定量, 新建结果表.
    pub fn open(config: RunConfig) -> anyhow::Result<Self> {
        fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("cannot create output directory {}", config.output_dir.display())
        })?;
        let results = if config.emphysema {
            let path = config.csv_path();
            let table = ResultsTable::create(&path)
                .with_context(|| format!("cannot create results table {}", path.display()))?;
            Some(table)
        } else {
            None
        };
        Ok(Self { config, results })
    }

    /// 运行配置.
    #[inline]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// 结果表路径, 未开启肺气肿定量时为 `None`.
    #[inline]
    pub fn results_path(&self) -> Option<&Path> {
        self.results.as_ref().map(ResultsTable::path)
    }
}

/// 单个输入的处理结果.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// 路径不符合 BIDS 命名, 未产生任何输出.
    Malformed,

    /// 读取、分割或保存掩码失败.
    SegmentationFailed,

    /// 掩码已保存. 开启肺气肿定量时附带定量状态.
    Segmented(Option<Status>),
}

/// 整个批次的计数.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 输入总数.
    pub inputs: usize,

    /// 路径不符合 BIDS 命名的输入数.
    pub malformed: usize,

    /// 分割阶段失败的输入数.
    pub segmentation_failed: usize,

    /// 成功保存掩码的输入数.
    pub segmented: usize,

    /// 肺气肿定量成功数.
    pub emphysema_success: usize,

    /// 肺气肿定量失败数.
    pub emphysema_fail: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: Outcome) {
        self.inputs += 1;
        match outcome {
            Outcome::Malformed => self.malformed += 1,
            Outcome::SegmentationFailed => self.segmentation_failed += 1,
            Outcome::Segmented(status) => {
                self.segmented += 1;
                match status {
                    Some(Status::Success) => self.emphysema_success += 1,
                    Some(Status::Fail) => self.emphysema_fail += 1,
                    None => {}
                }
            }
        }
    }

    /// 将计数写进日志.
    pub fn log(&self) {
        info!(
            "Finished {} inputs: {} segmented, {} failed, {} skipped (not BIDS).",
            self.inputs, self.segmented, self.segmentation_failed, self.malformed
        );
        if self.emphysema_success + self.emphysema_fail > 0 {
            info!(
                "Emphysema estimation: {} success, {} fail.",
                self.emphysema_success, self.emphysema_fail
            );
        }
    }
}

/// 依次处理 `inputs` 中的每个路径.
pub fn run<S, I>(ctx: &mut RunContext, segmenter: &S, inputs: I) -> RunSummary
where
    S: Segmenter,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut summary = RunSummary::default();
    for input in inputs {
        let outcome = process_one(ctx, segmenter, input.as_ref());
        summary.record(outcome);
    }
    summary
}

/// 处理单个输入. 不会因该输入的任何错误而中断.
pub fn process_one<S: Segmenter>(ctx: &mut RunContext, segmenter: &S, input: &str) -> Outcome {
    info!("input path: {input}");

    let outputs = match BidsOutputs::resolve(input, &ctx.config.output_dir, ctx.config.segmentation)
    {
        Ok(o) => o,
        Err(e) => {
            error!("{e}");
            return Outcome::Malformed;
        }
    };
    if let Err(e) = outputs.create_dir() {
        error!(
            "Error processing {input}: cannot create {}: {e}",
            outputs.output_dir.display()
        );
        return Outcome::SegmentationFailed;
    }

    let start = Instant::now();
    let (scan, label) = match segment_and_save(segmenter, input, &outputs) {
        Ok(v) => v,
        Err(e) => {
            error!("Error processing {input}: {e}");
            return Outcome::SegmentationFailed;
        }
    };
    info!(
        "Lung volume: {:.1} mL ({} voxels)",
        label.lung_volume_mm3() / 1000.0,
        label.count_nonzero()
    );

    let status = match ctx.results.as_mut() {
        Some(table) => {
            let (status, scores) = estimate_emphysema(&scan, &label, &outputs, input);
            let row = ResultRow {
                input_path: input,
                entity: &outputs.entity,
                status,
                elapsed: start.elapsed(),
                scores: scores.as_ref(),
            };
            if let Err(e) = table.append(&row) {
                error!("Cannot append results of {input} to {}: {e}", table.path().display());
            }
            Some(status)
        }
        None => None,
    };

    info!(
        "Processed {input} in {:.2} seconds. Mask saved to {}.",
        start.elapsed().as_secs_f64(),
        outputs.mask_path.display()
    );
    Outcome::Segmented(status)
}

/// 读取扫描, 分割, 并保存掩码. 无论分割器返回什么 header, 掩码都带着扫描的空间元信息落盘.
fn segment_and_save<S: Segmenter>(
    segmenter: &S,
    input: &str,
    outputs: &BidsOutputs,
) -> Result<(CtScan, CtLabel), SegmentError> {
    let scan = CtScan::open(input)?;
    let label = segmenter.segment(Path::new(input), &scan)?.rehome(&scan)?;
    label.save(&outputs.mask_path)?;
    Ok((scan, label))
}

/// 定量并保存报告与 LAA950 掩码. 任何失败都落成失败报告, 分数不计入结果表.
fn estimate_emphysema(
    scan: &CtScan,
    label: &CtLabel,
    outputs: &BidsOutputs,
    input: &str,
) -> (Status, Option<EmphysemaScores>) {
    let analysis = match emphysema::analyze(scan, label) {
        Ok(Some(a)) => a,
        Ok(None) => {
            error!("Failed to compute emphysema scores for {input}: no lung voxels in mask");
            save_failure(None, outputs);
            return (Status::Fail, None);
        }
        Err(e) => {
            error!("Error computing emphysema scores for {input}: {e}");
            save_failure(Some(&e), outputs);
            return (Status::Fail, None);
        }
    };

    let EmphysemaAnalysis { scores, mask } = analysis;
    if let Err(e) = report::save(&scores, &outputs.score_path) {
        error!("Error saving emphysema scores for {input}: {e}");
        save_failure(Some(&e), outputs);
        return (Status::Fail, None);
    }
    info!(
        "Emphysema scores computed and saved to {}",
        outputs.score_path.display()
    );
    if let Err(e) = mask.save(&outputs.emphysema_mask_path) {
        error!("Error saving LAA950 mask for {input}: {e}");
        save_failure(Some(&e), outputs);
        return (Status::Fail, None);
    }
    info!("LAA950 mask saved to {}", outputs.emphysema_mask_path.display());
    (Status::Success, Some(scores))
}

fn save_failure(detail: Option<&dyn Display>, outputs: &BidsOutputs) {
    if let Err(e) = report::save_failure(detail, &outputs.score_path) {
        error!(
            "Cannot write failure report {}: {e}",
            outputs.score_path.display()
        );
    }
}
