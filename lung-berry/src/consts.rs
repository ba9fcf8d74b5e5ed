//! 通用常量.

/// 单通道标签值.
pub mod gray {
    /// 分割结果中, 背景的体素值.
    pub const LABEL_BACKGROUND: u8 = 0;

    /// 二值掩码中, 前景 (肺组织 / 肺气肿体素) 的体素值.
    pub const LABEL_FOREGROUND: u8 = 1;

    /// 体素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, LABEL_BACKGROUND)
    }

    /// 体素是否属于肺? 肺分割下为 1 (右肺) 或 2 (左肺), 肺叶分割下为 1 ~ 5,
    /// 统一视作非零.
    #[inline]
    pub const fn is_lung(p: u8) -> bool {
        !is_background(p)
    }
}

/// CT HU 阈值.
pub mod hu {
    /// 低衰减区 (LAA) 阈值, 统计 `<=` 阈值的肺体素比例.
    pub const LAA_THRESHOLDS: [f64; 3] = [-950.0, -910.0, -856.0];

    /// 高衰减区 (HAA) 阈值, 统计 `>=` 阈值的肺体素比例.
    pub const HAA_THRESHOLDS: [f64; 4] = [-700.0, -600.0, -500.0, -250.0];

    /// 肺气肿掩码所用阈值 (LAA950).
    pub const EMPHYSEMA_THRESHOLD: f64 = -950.0;
}

/// 输入文件名中需要被替换的后缀.
pub const CT_SUFFIX: &str = "ct.nii.gz";

/// 肺气肿分数文本报告后缀.
pub const EMPH_REPORT_SUFFIX: &str = "desc-emph.txt";

/// LAA950 肺气肿掩码后缀.
pub const LAA950_MASK_SUFFIX: &str = "desc-laa950mask.nii.gz";

/// BIDS 输出目录中的模态子目录名.
pub const MODALITY_DIR: &str = "ct";

/// 缺失数值在 CSV 中的占位符.
pub const NOT_AVAILABLE: &str = "N/A";
