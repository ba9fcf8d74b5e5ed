//! 体数据的持久化存储.

use super::{CtLabel, CtScan, NiftiHeaderAttr, VolumeError};
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;
use std::path::Path;

/// 表明一个可以按原样持久化存储为 nifti 文件的 3D 体数据对象.
///
/// 写出时以自身 header 为参考, 因此体素分辨率、方向与原点信息均保持不变;
/// 数据类型由体素类型决定 (`CtLabel` 为 `u8`, `CtScan` 为 `f32`).
/// 路径以 `.gz` 结尾时会进行 gzip 压缩.
pub trait NiftiSave {
    /// 按原样将体数据保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), VolumeError>;
}

/// 写出用 header. 体素值已经是最终值, 因此需要清除线性缩放.
fn output_header(reference: &NiftiHeader) -> NiftiHeader {
    let mut header = reference.clone();
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    header
}

macro_rules! impl_nifti_save {
    ($($volume: ty),+) => {
        $(
            impl NiftiSave for $volume {
                fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), VolumeError> {
                    let header = output_header(self.header());
                    // (z, H, W) -> [W, H, z], nifti 惯用顺序.
                    let data = self.data().permuted_axes([2, 1, 0]);
                    WriterOptions::new(path.as_ref())
                        .reference_header(&header)
                        .write_nifti(&data)?;
                    Ok(())
                }
            }
        )+
    };
}

impl_nifti_save!(CtScan, CtLabel);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_label_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub-001_ses-01_desc-lungsmask.nii.gz");

        let mut data = Array3::<u8>::zeros((3, 4, 5));
        data[(0, 0, 0)] = 1;
        data[(1, 2, 3)] = 2;
        data[(2, 3, 4)] = 5;
        let label = CtLabel::fake(data.clone(), [2.0, 0.75, 0.75]);
        label.save(&path).unwrap();

        let back = CtLabel::open(&path).unwrap();
        assert_eq!(back.shape(), (3, 4, 5));
        assert_eq!(back.data(), data.view());
        assert_eq!(back.pix_dim(), label.pix_dim());
        assert_eq!(back.header().qform_code, label.header().qform_code);
        assert_eq!(back.header().sform_code, label.header().sform_code);
    }

    #[test]
    fn test_scan_round_trip_keeps_hu() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.nii");

        let data = Array3::from_shape_fn((2, 3, 4), |(z, h, w)| {
            -1000.0 + (z * 100 + h * 10 + w) as f32
        });
        let scan = CtScan::fake(data.clone(), [1.0, 1.0, 1.0]);
        scan.save(&path).unwrap();

        let back = CtScan::open(&path).unwrap();
        assert_eq!(back.shape(), (2, 3, 4));
        assert_eq!(back.data(), data.view());
        assert_eq!(back.data()[(1, 2, 3)], -877.0);
    }

    #[test]
    fn test_label_on_scan_grid_keeps_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let scan_path = dir.path().join("ct.nii.gz");
        let mask_path = dir.path().join("mask.nii.gz");

        let scan = CtScan::fake(Array3::from_elem((2, 2, 2), -900.0), [3.0, 0.6, 0.6]);
        scan.save(&scan_path).unwrap();
        let scan = CtScan::open(&scan_path).unwrap();

        let label = CtLabel::from_scan_grid(&scan, Array3::from_elem((2, 2, 2), 1)).unwrap();
        label.save(&mask_path).unwrap();
        let back = CtLabel::open(&mask_path).unwrap();

        assert_eq!(back.pix_dim(), scan.pix_dim());
        assert_eq!(back.header().quatern_b, scan.header().quatern_b);
        assert_eq!(back.header().srow_x, scan.header().srow_x);
        assert_eq!(back.count_nonzero(), 8);
    }
}
