//! 命令行参数与运行配置.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lung_berry::segment::{LungmaskCommand, SegmentationKind};

use crate::result::CSV_FILE_NAME;

/// 日志文件名, 位于输出根目录下.
pub const LOG_FILE_NAME: &str = "lung_mask.log";

/// 命令行上的分割粒度.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SegmentationArg {
    /// Left and right lung.
    Lungs,
    /// All 5 lobes.
    Lobes,
}

impl From<SegmentationArg> for SegmentationKind {
    fn from(value: SegmentationArg) -> Self {
        match value {
            SegmentationArg::Lungs => SegmentationKind::Lungs,
            SegmentationArg::Lobes => SegmentationKind::Lobes,
        }
    }
}

/// LungMask segmentation of BIDS-organized chest CT scans.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Segmentation: `lungs` for left and right lung, `lobes` for all 5 lobes.
    #[arg(long, value_enum, default_value_t = SegmentationArg::Lungs)]
    pub segmentation: SegmentationArg,

    /// Run the fill model in addition to improve the segmentation. Requires more time and resources.
    #[arg(long)]
    pub fill: bool,

    /// Text file containing the input file paths, one per line.
    #[arg(long, default_value = "file_paths.txt")]
    pub input_list: PathBuf,

    /// Directory to save output files.
    #[arg(long, default_value = "./derived/pipeline/")]
    pub output_dir: PathBuf,

    /// Compute emphysema metrics (LAA950 etc.) on the segmented lungs.
    #[arg(long)]
    pub emphysema: bool,

    /// `lungmask` executable used for segmentation.
    #[arg(long, env = "LUNGMASK_BIN", default_value = "lungmask")]
    pub lungmask_bin: PathBuf,
}

/// 一次批处理的运行配置.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// 分割粒度.
    pub segmentation: SegmentationKind,

    /// 是否额外运行填充模型.
    pub fill: bool,

    /// 输入清单路径.
    pub input_list: PathBuf,

    /// 输出根目录.
    pub output_dir: PathBuf,

    /// 是否进行肺气肿定量.
    pub emphysema: bool,

    /// `lungmask` 可执行文件.
    pub lungmask_bin: PathBuf,
}

impl From<Args> for RunConfig {
    fn from(args: Args) -> Self {
        Self {
            segmentation: args.segmentation.into(),
            fill: args.fill,
            input_list: args.input_list,
            output_dir: args.output_dir,
            emphysema: args.emphysema,
            lungmask_bin: args.lungmask_bin,
        }
    }
}

impl RunConfig {
    /// 日志文件路径.
    #[inline]
    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(LOG_FILE_NAME)
    }

    /// 结果表路径. 仅在进行肺气肿定量时才会生成该文件.
    #[inline]
    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(CSV_FILE_NAME)
    }

    /// 按配置创建 `lungmask` 分割适配器.
    pub fn segmenter(&self) -> LungmaskCommand {
        LungmaskCommand::new(&self.lungmask_bin, self.segmentation, self.fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["lungmask-bids"]).unwrap();
        let config = RunConfig::from(args);
        assert_eq!(config.segmentation, SegmentationKind::Lungs);
        assert!(!config.fill);
        assert!(!config.emphysema);
        assert_eq!(config.input_list, PathBuf::from("file_paths.txt"));
        assert_eq!(config.output_dir, PathBuf::from("./derived/pipeline/"));
        assert_eq!(
            config.log_path(),
            PathBuf::from("./derived/pipeline/lung_mask.log")
        );
        assert_eq!(
            config.csv_path(),
            PathBuf::from("./derived/pipeline/emphysema_results.csv")
        );
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "lungmask-bids",
            "--segmentation",
            "lobes",
            "--fill",
            "--emphysema",
            "--input-list",
            "list.txt",
            "--output-dir",
            "/tmp/out",
            "--lungmask-bin",
            "/opt/lungmask/bin/lungmask",
        ])
        .unwrap();
        let config = RunConfig::from(args);
        assert_eq!(config.segmentation, SegmentationKind::Lobes);
        assert!(config.fill);
        assert!(config.emphysema);
        assert_eq!(config.input_list, PathBuf::from("list.txt"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.segmenter().kind(), SegmentationKind::Lobes);
    }

    #[test]
    fn test_rejects_unknown_segmentation() {
        assert!(Args::try_parse_from(["lungmask-bids", "--segmentation", "airways"]).is_err());
    }
}
