//! BIDS 目录规范下的胸部 CT 批处理: 肺分割, 以及可选的肺气肿定量.
//!
//! 输入清单中的每个文件独立处理, 单个文件的失败不会中断整个批次.

pub mod config;
pub mod result;
pub mod runner;
