//! 肺气肿结果汇总表.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lung_berry::bids::BidsEntity;
use lung_berry::consts::NOT_AVAILABLE;
use lung_berry::emphysema::EmphysemaScores;

/// 结果表文件名, 位于输出根目录下.
pub const CSV_FILE_NAME: &str = "emphysema_results.csv";

/// 每行的身份列, 位于分数列之前.
const IDENTITY_COLUMNS: [&str; 5] = [
    "input_path",
    "subject_id",
    "session_id",
    "status",
    "processing_time_seconds",
];

/// 完整表头: 身份列 + 16 个分数列.
pub fn header() -> Vec<&'static str> {
    IDENTITY_COLUMNS
        .iter()
        .chain(EmphysemaScores::COLUMNS.iter())
        .copied()
        .collect()
}

/// 单个输入的肺气肿定量状态.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// 分数已计算并保存.
    Success,

    /// 定量失败, 分数列为占位符.
    Fail,
}

impl Status {
    /// 表中使用的文本.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fail => "fail",
        }
    }
}

/// 表中的一行.
#[derive(Clone, Debug)]
pub struct ResultRow<'a> {
    /// 输入清单中的原始路径.
    pub input_path: &'a str,

    /// 受试者与会话.
    pub entity: &'a BidsEntity,

    /// 定量状态.
    pub status: Status,

    /// 从分割开始到定量结束的耗时.
    pub elapsed: Duration,

    /// 定量成功时的分数.
    pub scores: Option<&'a EmphysemaScores>,
}

impl ResultRow<'_> {
    fn record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(IDENTITY_COLUMNS.len() + EmphysemaScores::COLUMNS.len());
        record.push(self.input_path.to_owned());
        record.push(self.entity.subject.clone());
        record.push(self.entity.session.clone());
        record.push(self.status.as_str().to_owned());
        record.push(self.elapsed.as_secs_f64().to_string());
        match self.scores {
            Some(s) => record.extend(s.as_row().iter().map(f64::to_string)),
            None => record.extend(
                std::iter::repeat(NOT_AVAILABLE.to_owned()).take(EmphysemaScores::COLUMNS.len()),
            ),
        }
        record
    }
}

/// 运行期间一直打开的结果表. 每追加一行立即落盘.
pub struct ResultsTable {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl ResultsTable {
    /// 新建 (覆盖) 结果表并写入表头.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        let path = path.as_ref().to_path_buf();
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(header())?;
        writer.flush()?;
        Ok(Self { path, writer })
    }

    /// 追加一行.
    pub fn append(&mut self, row: &ResultRow<'_>) -> Result<(), csv::Error> {
        self.writer.write_record(row.record())?;
        self.writer.flush()?;
        Ok(())
    }

    /// 结果表路径.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> BidsEntity {
        BidsEntity {
            subject: "sub-042".to_owned(),
            session: "ses-01A".to_owned(),
        }
    }

    fn read_rows(path: &Path) -> (csv::StringRecord, Vec<csv::StringRecord>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().clone();
        let rows = reader.records().map(Result::unwrap).collect();
        (headers, rows)
    }

    #[test]
    fn test_header_layout() {
        let h = header();
        assert_eq!(h.len(), 21);
        assert_eq!(h[0], "input_path");
        assert_eq!(h[4], "processing_time_seconds");
        assert_eq!(h[5], "LAA950");
        assert_eq!(h[20], "HUMax");
    }

    #[test]
    fn test_create_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CSV_FILE_NAME);
        let table = ResultsTable::create(&path).unwrap();
        assert_eq!(table.path(), path.as_path());

        let (headers, rows) = read_rows(&path);
        assert_eq!(headers.len(), 21);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_failed_row_uses_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CSV_FILE_NAME);
        let mut table = ResultsTable::create(&path).unwrap();
        let e = entity();
        table
            .append(&ResultRow {
                input_path: "/data/sub-042/ses-01A/ct/sub-042_ses-01A_ct.nii.gz",
                entity: &e,
                status: Status::Fail,
                elapsed: Duration::from_millis(1500),
                scores: None,
            })
            .unwrap();

        let (_, rows) = read_rows(&path);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(&row[1], "sub-042");
        assert_eq!(&row[2], "ses-01A");
        assert_eq!(&row[3], "fail");
        assert_eq!(&row[4], "1.5");
        assert!(row.iter().skip(5).all(|v| v == NOT_AVAILABLE));
    }

    #[test]
    fn test_success_row_carries_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CSV_FILE_NAME);
        let mut table = ResultsTable::create(&path).unwrap();
        let e = entity();
        let scores = EmphysemaScores {
            laa950: 0.25,
            laa910: 0.5,
            laa856: 0.75,
            haa700: 0.125,
            haa600: 0.0625,
            haa500: 0.0,
            haa250: 0.0,
            perc15: -960.5,
            perc10: -970.0,
            hu_mean: -850.0,
            hu_std: 100.0,
            hu_kurtosis: f64::NAN,
            hu_skewness: -0.5,
            hu_median: -860.0,
            hu_min: -1024.0,
            hu_max: -300.0,
        };
        for _ in 0..2 {
            table
                .append(&ResultRow {
                    input_path: "sub-042_ses-01A_ct.nii.gz",
                    entity: &e,
                    status: Status::Success,
                    elapsed: Duration::from_secs(3),
                    scores: Some(&scores),
                })
                .unwrap();
        }

        let (_, rows) = read_rows(&path);
        assert_eq!(rows.len(), 2);
        let row = &rows[0];
        assert_eq!(&row[3], "success");
        assert_eq!(&row[4], "3");
        assert_eq!(&row[5], "0.25");
        assert_eq!(&row[13], "-970");
        assert_eq!(&row[16], "NaN");
        assert_eq!(&row[20], "-300");
    }
}
