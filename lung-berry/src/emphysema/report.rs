//! 肺气肿分数的文本报告.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::EmphysemaScores;

/// 定量失败时报告文件的内容.
pub const FAILURE_LINE: &str = "FAILED EMPHYSEMA ESTIMATION";

const TITLE: &str = "EMPHYSEMA ANALYSIS RESULTS";
const RULE_WIDTH: usize = 40;
const S2: &str = "  ";

/// 将 `s` 以人类可读的格式写进 `w` 中.
///
/// 比例保留 6 位小数, 百分位数与 HU 统计量保留 2 位, 峰度与偏度保留 4 位.
pub fn describe_into<W: Write>(s: &EmphysemaScores, w: &mut W) -> io::Result<()> {
    writeln!(w, "{TITLE}")?;
    writeln!(w, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(w)?;

    writeln!(w, "Low Attenuation Areas (LAA):")?;
    writeln!(w, "{S2}LAA950: {:.6}", s.laa950)?;
    writeln!(w, "{S2}LAA910: {:.6}", s.laa910)?;
    writeln!(w, "{S2}LAA856: {:.6}", s.laa856)?;
    writeln!(w)?;

    writeln!(w, "High Attenuation Areas (HAA):")?;
    writeln!(w, "{S2}HAA700: {:.6}", s.haa700)?;
    writeln!(w, "{S2}HAA600: {:.6}", s.haa600)?;
    writeln!(w, "{S2}HAA500: {:.6}", s.haa500)?;
    writeln!(w, "{S2}HAA250: {:.6}", s.haa250)?;
    writeln!(w)?;

    writeln!(w, "Percentiles:")?;
    writeln!(w, "{S2}15thPercentile: {:.2}", s.perc15)?;
    writeln!(w, "{S2}10thPercentile: {:.2}", s.perc10)?;
    writeln!(w)?;

    writeln!(w, "Hounsfield Unit Statistics:")?;
    writeln!(w, "{S2}Mean: {:.2}", s.hu_mean)?;
    writeln!(w, "{S2}Std: {:.2}", s.hu_std)?;
    writeln!(w, "{S2}Median: {:.2}", s.hu_median)?;
    writeln!(w, "{S2}Kurtosis: {:.4}", s.hu_kurtosis)?;
    writeln!(w, "{S2}Skewness: {:.4}", s.hu_skewness)?;
    writeln!(w, "{S2}Min: {:.2}", s.hu_min)?;
    writeln!(w, "{S2}Max: {:.2}", s.hu_max)?;
    Ok(())
}

/// 将失败信息写进 `w` 中. `detail` 存在时附在失败标记之后.
pub fn describe_failure_into<W: Write>(detail: Option<&dyn Display>, w: &mut W) -> io::Result<()> {
    match detail {
        Some(d) => writeln!(w, "{FAILURE_LINE}: {d}"),
        None => writeln!(w, "{FAILURE_LINE}"),
    }
}

/// 将报告写入 `path` (覆盖已有文件).
pub fn save<P: AsRef<Path>>(s: &EmphysemaScores, path: P) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    describe_into(s, &mut w)?;
    w.flush()
}

/// 将失败报告写入 `path` (覆盖已有文件).
pub fn save_failure<P: AsRef<Path>>(detail: Option<&dyn Display>, path: P) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    describe_failure_into(detail, &mut w)?;
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores() -> EmphysemaScores {
        EmphysemaScores {
            laa950: 0.123_456_78,
            laa910: 0.2,
            laa856: 0.3,
            haa700: 0.04,
            haa600: 0.03,
            haa500: 0.02,
            haa250: 0.01,
            perc15: -951.458,
            perc10: -963.0,
            hu_mean: -845.5,
            hu_std: 120.125,
            hu_kurtosis: 1.234_56,
            hu_skewness: -0.5,
            hu_median: -870.0,
            hu_min: -1024.0,
            hu_max: 300.0,
        }
    }

    fn render(s: &EmphysemaScores) -> String {
        let mut buf = Vec::with_capacity(512);
        describe_into(s, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_layout() {
        let text = render(&scores());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "EMPHYSEMA ANALYSIS RESULTS");
        assert_eq!(lines[1], "=".repeat(40));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Low Attenuation Areas (LAA):");
        assert_eq!(lines[4], "  LAA950: 0.123457");
        assert_eq!(lines[8], "High Attenuation Areas (HAA):");
        assert_eq!(lines[12], "  HAA250: 0.010000");
        assert_eq!(lines[14], "Percentiles:");
        assert_eq!(lines[15], "  15thPercentile: -951.46");
        assert_eq!(lines[18], "Hounsfield Unit Statistics:");
        assert_eq!(lines[19], "  Mean: -845.50");
        assert_eq!(lines[22], "  Kurtosis: 1.2346");
        assert_eq!(lines[23], "  Skewness: -0.5000");
        assert_eq!(lines[25], "  Max: 300.00");
        assert_eq!(lines.len(), 26);
    }

    #[test]
    fn test_failure_lines() {
        let mut buf = Vec::new();
        describe_failure_into(None, &mut buf).unwrap();
        assert_eq!(buf, b"FAILED EMPHYSEMA ESTIMATION\n");

        let mut buf = Vec::new();
        describe_failure_into(Some(&"bad voxel"), &mut buf).unwrap();
        assert_eq!(buf, b"FAILED EMPHYSEMA ESTIMATION: bad voxel\n");
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub-1_ses-1_desc-emph.txt");
        save_failure(None, &path).unwrap();
        save(&scores(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("EMPHYSEMA ANALYSIS RESULTS\n"));
        assert!(!text.contains(FAILURE_LINE));
    }
}
