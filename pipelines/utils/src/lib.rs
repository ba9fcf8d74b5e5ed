//! 批处理程序依赖的通用组件.

pub mod loader;
pub mod logging;
