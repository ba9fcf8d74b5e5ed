//! 肺分割适配层.
//!
//! 分割模型本身不在本 crate 中实现. 本模块只规定适配器的契约 ([`Segmenter`]):
//! 给定一个 3D CT 扫描, 返回与其处于同一体素网格的标签.

use std::fmt;
use std::path::Path;

use crate::data::VolumeError;
use crate::{CtLabel, CtScan};

mod lungmask;

pub use lungmask::LungmaskCommand;

/// 分割粒度.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SegmentationKind {
    /// 左右两肺.
    Lungs,

    /// 全部 5 个肺叶.
    Lobes,
}

impl SegmentationKind {
    /// 输出文件名中使用的名称.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lungs => "lungs",
            Self::Lobes => "lobes",
        }
    }

    /// 对应的 lungmask 预训练模型名称.
    #[inline]
    pub const fn model_name(&self) -> &'static str {
        match self {
            Self::Lungs => "R231",
            Self::Lobes => "LTRCLobes",
        }
    }
}

impl fmt::Display for SegmentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 分割或其前后的体数据 I/O 失败.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    /// 无法启动外部分割程序.
    #[error("cannot launch `{program}`: {source}")]
    Launch {
        /// 程序名或路径.
        program: String,
        /// 底层错误.
        #[source]
        source: std::io::Error,
    },

    /// 外部分割程序以非零状态退出.
    #[error("`{program}` exited with {status}: {stderr}")]
    Exit {
        /// 程序名或路径.
        program: String,
        /// 退出状态.
        status: std::process::ExitStatus,
        /// 标准错误输出 (已截去首尾空白).
        stderr: String,
    },

    /// 临时文件相关的 I/O 错误.
    #[error("scratch file: {0}")]
    Scratch(#[from] std::io::Error),

    /// 读写体数据失败, 或分割结果与扫描不在同一网格上.
    #[error(transparent)]
    Volume(#[from] VolumeError),
}

/// 分割模型适配器.
pub trait Segmenter {
    /// 对位于 `input` 的扫描 `scan` 进行分割.
    ///
    /// 返回的标签应与 `scan` 形状一致. 0 为背景, 非零为肺 (或肺叶编号).
    /// 调用方保存前会用 [`CtLabel::rehome`] 将其搬到 `scan` 的 header 之下.
    fn segment(&self, input: &Path, scan: &CtScan) -> Result<CtLabel, SegmentError>;
}

impl<S: Segmenter + ?Sized> Segmenter for &S {
    #[inline]
    fn segment(&self, input: &Path, scan: &CtScan) -> Result<CtLabel, SegmentError> {
        (**self).segment(input, scan)
    }
}
