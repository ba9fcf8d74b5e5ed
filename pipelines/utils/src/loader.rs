//! 输入清单加载.

use std::fs;
use std::io;
use std::path::Path;

/// 读取输入清单: 每行一个文件路径, 去掉首尾空白.
///
/// 空行会被原样保留为空字符串, 交由调用方按非法路径处理.
pub fn read_input_list<P: AsRef<Path>>(path: P) -> io::Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(|l| l.trim().to_owned()).collect())
}
