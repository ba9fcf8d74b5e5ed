//! 基于外部 `lungmask` 命令行程序的分割适配器.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::{SegmentError, SegmentationKind, Segmenter};
use crate::{CtLabel, CtScan};

/// 以 `R231` 补全漏分区域的肺叶模型.
const FILLED_LOBES_MODEL: &str = "LTRCLobes_R231";

/// 调用 `lungmask <input> <output> --modelname <model>` 完成分割, 再将输出读回.
///
/// `lungmask` 命令行没有单独的填充模型参数, 填充通过组合模型名表达:
/// 肺叶 + 填充即 `LTRCLobes_R231`. 两肺模型本身就是 `R231`, 再用 `R231` 填充没有意义,
/// 此时忽略填充开关.
///
/// 读回的标签保留 `lungmask` 写出的 header; 空间元信息由调用方对齐 (见 [`CtLabel::rehome`]).
#[derive(Clone, Debug)]
pub struct LungmaskCommand {
    program: PathBuf,
    kind: SegmentationKind,
    fill: bool,
}

impl LungmaskCommand {
    /// 创建适配器. `program` 为 `lungmask` 可执行文件名或路径.
    pub fn new<P: Into<PathBuf>>(program: P, kind: SegmentationKind, fill: bool) -> Self {
        Self {
            program: program.into(),
            kind,
            fill,
        }
    }

    /// 分割粒度.
    #[inline]
    pub fn kind(&self) -> SegmentationKind {
        self.kind
    }

    /// 组装命令行参数 (不含程序名).
    fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            input.into(),
            output.into(),
            "--modelname".into(),
            self.model_name().into(),
        ]
    }

    /// 实际传给 `lungmask` 的模型名.
    fn model_name(&self) -> &'static str {
        match (self.kind, self.fill) {
            (SegmentationKind::Lobes, true) => FILLED_LOBES_MODEL,
            (SegmentationKind::Lungs, true) => {
                debug!("fill model has no effect on {}, ignored", self.kind.model_name());
                self.kind.model_name()
            }
            (kind, false) => kind.model_name(),
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Segmenter for LungmaskCommand {
    fn segment(&self, input: &Path, _scan: &CtScan) -> Result<CtLabel, SegmentError> {
        let scratch = tempfile::Builder::new()
            .prefix("lungmask-")
            .suffix(".nii.gz")
            .tempfile()?;

        let args = self.args(input, scratch.path());
        debug!("running {} {:?}", self.program_name(), args);
        let out = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| SegmentError::Launch {
                program: self.program_name(),
                source,
            })?;
        if !out.status.success() {
            return Err(SegmentError::Exit {
                program: self.program_name(),
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_owned(),
            });
        }

        Ok(CtLabel::open(scratch.path())?)
    }
}
