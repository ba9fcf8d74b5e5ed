//! BIDS 风格的路径解析.
//!
//! 输入路径中需要出现 `sub-<数字>` 和 `ses-<字母或数字>` 两段实体标识 (位置任意,
//! 取第一次出现). 输出文件按照 `{输出根目录}/{sub}/{ses}/ct/` 组织, 文件名由输入文件名中的
//! `ct.nii.gz` 后缀替换而来.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::consts::{CT_SUFFIX, EMPH_REPORT_SUFFIX, LAA950_MASK_SUFFIX, MODALITY_DIR};
use crate::segment::SegmentationKind;

static SUBJECT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"sub-\d+").unwrap());
static SESSION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"ses-[A-Za-z0-9]+").unwrap());

/// 路径解析错误.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// 输入路径中找不到 `sub-*` 或 `ses-*` 实体.
    #[error("BIDS format not found in {0}")]
    MalformedInputPath(String),
}

/// 从输入路径中提取出的受试者与扫描会话标识.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidsEntity {
    /// 形如 `sub-042`.
    pub subject: String,

    /// 形如 `ses-01A`.
    pub session: String,
}

impl BidsEntity {
    /// 从 `path` 中提取实体. 任一实体缺失时返回 `Err`.
    pub fn parse(path: &str) -> Result<Self, ResolveError> {
        let malformed = || ResolveError::MalformedInputPath(path.to_owned());
        let subject = SUBJECT_PATTERN.find(path).ok_or_else(malformed)?;
        let session = SESSION_PATTERN.find(path).ok_or_else(malformed)?;
        Ok(Self {
            subject: subject.as_str().to_owned(),
            session: session.as_str().to_owned(),
        })
    }
}

/// 单个输入文件对应的全部输出位置.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidsOutputs {
    /// 输入路径中的实体.
    pub entity: BidsEntity,

    /// `{输出根目录}/{sub}/{ses}/ct`.
    pub output_dir: PathBuf,

    /// 分割掩码, `*desc-{lungs,lobes}mask.nii.gz`.
    pub mask_path: PathBuf,

    /// 肺气肿文本报告, `*desc-emph.txt`.
    pub score_path: PathBuf,

    /// LAA950 肺气肿掩码, `*desc-laa950mask.nii.gz`.
    pub emphysema_mask_path: PathBuf,
}

impl BidsOutputs {
    /// 解析 `input` 的输出位置. 该操作不接触文件系统.
    ///
    /// # 注意
    ///
    /// 文件名替换只是字面意义上的子串替换. 若输入文件名不含 `ct.nii.gz`,
    /// 则所有输出文件名都与输入文件名相同, 调用方应事先保证命名规范.
    pub fn resolve<P: AsRef<Path>>(
        input: &str,
        output_root: P,
        kind: SegmentationKind,
    ) -> Result<Self, ResolveError> {
        let entity = BidsEntity::parse(input)?;

        let mut output_dir = output_root.as_ref().to_path_buf();
        output_dir.extend([entity.subject.as_str(), entity.session.as_str(), MODALITY_DIR]);

        let file_name = Path::new(input)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let derive = |suffix: &str| output_dir.join(file_name.replace(CT_SUFFIX, suffix));

        Ok(Self {
            mask_path: derive(&format!("desc-{}mask.nii.gz", kind.as_str())),
            score_path: derive(EMPH_REPORT_SUFFIX),
            emphysema_mask_path: derive(LAA950_MASK_SUFFIX),
            output_dir,
            entity,
        })
    }

    /// 创建输出目录 (递归, 已存在时不报错).
    #[inline]
    pub fn create_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.output_dir)
    }
}
