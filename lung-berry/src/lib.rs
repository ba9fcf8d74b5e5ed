#![warn(missing_docs)]

//! 核心库. 提供 BIDS 目录规范下胸部 CT 扫描 (nifti) 的结构化读写、肺分割适配,
//! 以及基于肺分割结果的肺气肿定量.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 分割模型本身不在本 crate 中实现, 只通过 [`segment::Segmenter`] 适配.
//!   默认适配器调用外部 `lungmask` 程序.
//! 2. 体数据按照 `(z, h, w)` 行优先访问, 与 nifti 原生的 `[W, H, z]` 顺序相反.
//!   读写时自动转换.
//!
//! # 功能
//!
//! ### 3D 体数据读写 ✅
//!
//! `CtScan` (HU, `f32`) 与 `CtLabel` (标签, `u8`), 支持 `.nii` 与 `.nii.gz`.
//! 写出时保持体素网格与空间元信息.
//!
//! 实现位于 `lung-berry/src/data`.
//!
//! ### BIDS 路径解析 ✅
//!
//! 从输入路径中提取 `sub-*` / `ses-*`, 并推导输出目录与输出文件名.
//!
//! 实现位于 `lung-berry/src/bids.rs`.
//!
//! ### 肺气肿定量 ✅
//!
//! LAA / HAA 比例、百分位数、HU 分布统计量, 以及 LAA950 肺气肿掩码与文本报告.
//!
//! 实现位于 `lung-berry/src/emphysema`.

/// 三维索引, `(z, h, w)`.
pub type Idx3d = (usize, usize, usize);

/// 3D CT nii 文件基础数据结构.
mod data;

pub use data::{CtLabel, CtScan, NiftiHeaderAttr, NiftiSave, VolumeError};

pub mod bids;
pub mod consts;
pub mod emphysema;
pub mod prelude;
pub mod segment;
