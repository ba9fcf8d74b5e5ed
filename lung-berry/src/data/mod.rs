use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::gray::is_lung;
use crate::Idx3d;

mod save;

pub use save::NiftiSave;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 读写 3D 体数据时的错误.
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    /// 底层 nifti 读写错误.
    #[error("nifti I/O failed: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 文件不是 3D 体数据 (去掉末尾长度为 1 的维度后仍不是三维).
    #[error("expected a 3-D volume, found shape {0:?}")]
    NotVolumetric(Vec<usize>),

    /// 两份体数据不在同一体素网格上.
    #[error("volume shape {found:?} does not match reference grid {expected:?}")]
    ShapeMismatch {
        /// 参考网格形状, `(z, h, w)`.
        expected: Idx3d,
        /// 实际形状, `(z, h, w)`.
        found: Idx3d,
    },

    /// 数据无法重排成三维数组.
    #[error("cannot arrange voxels into a 3-D array: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// nii 格式 3D CT 扫描, 包括 header 和 CT 扫描 (HU). HU 值以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct CtScan {
    header: BoxedHeader,
    data: Array3<f32>,
}

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 将 `(z, h, w)` 形状写回 header 的 `dim` 字段.
fn set_header_shape(header: &mut NiftiHeader, (z, h, w): Idx3d) {
    header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
}

/// 将 nifti 原生的 `[W, H, z, (1, ...)]` 数组转换成按 `(z, H, W)` 行优先存储的三维数组.
///
/// 末尾长度为 1 的维度 (如单帧时间轴) 会被丢弃.
fn into_zhw<T: Clone>(data: ArrayD<T>) -> Result<Array3<T>, VolumeError> {
    let dims = data.shape().to_vec();
    if dims.len() < 3 || dims[3..].iter().any(|&d| d != 1) {
        return Err(VolumeError::NotVolumetric(dims));
    }
    let mut data = data;
    while data.ndim() > 3 {
        let last = data.ndim() - 1;
        data = data.index_axis_move(Axis(last), 0);
    }

    // [W, H, z] -> [z, H, W].
    // hint: 原第一维向下增长, 原第二维向右增长.
    let data = data.into_dimensionality::<Ix3>()?.permuted_axes([2, 1, 0]);

    // The nature of nifti data field layout: 通常无需复制.
    Ok(if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().into_owned()
    })
}

/// 创建一个仅携带体素分辨率的最小 header. `pix_dim` 按照 \[z, h, w\] 格式给出.
fn minimal_header(shape: Idx3d, pix_dim: [f32; 3]) -> BoxedHeader {
    let mut header = Box::<NiftiHeader>::default();
    set_header_shape(&mut header, shape);
    let [z, h, w] = pix_dim;
    let [_, pw, ph, pz, ..] = &mut header.pixdim;
    (*pw, *ph, *pz) = (w, h, z);
    header
}

/// 3D CT nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表空间 (相邻切片方向),
    /// 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [z as f64, h as f64, w as f64]
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.pix_dim().iter().product()
    }

    /// 与 `other` 是否处于同一体素网格 (形状一致)?
    #[inline]
    fn same_grid<O: NiftiHeaderAttr>(&self, other: &O) -> bool {
        self.shape() == other.shape()
    }
}

impl NiftiHeaderAttr for CtScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl CtScan {
    /// 打开 nii 文件格式的 3D CT 扫描. `path` 为 nii 文件的本地路径.
    /// 体素值会按 header 中的 `scl_slope` / `scl_inter` 换算为 HU.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VolumeError> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let mut header = Box::new(obj.header().clone());
        let data = into_zhw(obj.into_volume().into_ndarray::<f32>()?)?;
        set_header_shape(&mut header, data.dim());
        Ok(Self { header, data })
    }

    /// 根据裸 HU 数据和体素分辨率直接创建 `CtScan` 实体.
    ///
    /// # 参数
    ///
    /// 1. `data` 按照 \[z, h, w\] 格式存储, 与 `self.data()` 一致.
    /// 2. `pix_dim` 按照 \[z, h, w\] 格式存储, 以毫米为单位.
    ///
    /// # 注意
    ///
    /// 生成的 header 不携带方向与原点信息, 你应仅将其用于实验或测试目的.
    pub fn fake(data: Array3<f32>, pix_dim: [f32; 3]) -> Self {
        let header = minimal_header(data.dim(), pix_dim);
        Self { header, data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }
}

/// nii 格式 3D CT 标注 (分割掩码), 包括 header 和标签. 标签值以 `u8` 保存.
///
/// 0 为背景, 非零为肺 (或肺叶) 区域.
#[derive(Debug, Clone)]
pub struct CtLabel {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for CtLabel {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl CtLabel {
    /// 打开 nii 文件格式的 3D CT 标注. `path` 为 nii 文件的本地路径. 如果打开成功,
    /// 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VolumeError> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let mut header = Box::new(obj.header().clone());
        let data = into_zhw(obj.into_volume().into_ndarray::<u8>()?)?;
        set_header_shape(&mut header, data.dim());
        Ok(Self { header, data })
    }

    /// 以 `scan` 的 header (体素网格、分辨率、方向与原点) 为模板, 用 `data` 创建标注.
    ///
    /// `data` 按照 \[z, h, w\] 格式存储. 形状与 `scan` 不一致时返回 `Err`.
    pub fn from_scan_grid(scan: &CtScan, data: Array3<u8>) -> Result<Self, VolumeError> {
        if data.dim() != scan.shape() {
            return Err(VolumeError::ShapeMismatch {
                expected: scan.shape(),
                found: data.dim(),
            });
        }
        Ok(Self {
            header: scan.header.clone(),
            data,
        })
    }

    /// 将自身的标签搬到 `scan` 的 header 之下, 即拷贝 `scan` 的空间元信息.
    ///
    /// 形状与 `scan` 不一致时返回 `Err`.
    #[inline]
    pub fn rehome(self, scan: &CtScan) -> Result<Self, VolumeError> {
        Self::from_scan_grid(scan, self.data)
    }

    /// 根据裸标签数据和体素分辨率直接创建 `CtLabel` 实体.
    ///
    /// `data` 与 `pix_dim` 均按照 \[z, h, w\] 格式给出.
    ///
    /// # 注意
    ///
    /// 生成的 header 不携带方向与原点信息, 你应仅将其用于实验或测试目的.
    pub fn fake(data: Array3<u8>, pix_dim: [f32; 3]) -> Self {
        let header = minimal_header(data.dim(), pix_dim);
        Self { header, data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获取 3D 标注中非零 (肺) 体素的个数.
    #[inline]
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|p| is_lung(**p)).count()
    }

    /// 获取 3D 标注中非零体素所占的实际体积, 以立方毫米为单位.
    #[inline]
    pub fn lung_volume_mm3(&self) -> f64 {
        self.count_nonzero() as f64 * self.voxel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, ShapeBuilder};

    #[test]
    fn test_fake_shape_and_spacing() {
        let scan = CtScan::fake(Array3::zeros((4, 3, 2)), [2.5, 0.7, 0.7]);
        assert_eq!(scan.shape(), (4, 3, 2));
        assert_eq!(scan.data().len(), 24);
        let [z, h, w] = scan.pix_dim();
        assert!((z - 2.5).abs() < 1e-6);
        assert!((h - 0.7).abs() < 1e-6);
        assert!((w - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_from_scan_grid_copies_header() {
        let scan = CtScan::fake(Array3::zeros((2, 2, 2)), [1.0, 0.5, 0.5]);
        let mut data = Array3::zeros((2, 2, 2));
        data[(1, 0, 1)] = 1;
        let label = CtLabel::from_scan_grid(&scan, data).unwrap();
        assert!(label.same_grid(&scan));
        assert_eq!(label.pix_dim(), scan.pix_dim());
        assert_eq!(label.count_nonzero(), 1);
        assert!((label.lung_volume_mm3() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_from_scan_grid_rejects_other_shape() {
        let scan = CtScan::fake(Array3::zeros((2, 2, 2)), [1.0, 1.0, 1.0]);
        let err = CtLabel::from_scan_grid(&scan, Array3::zeros((2, 2, 3))).unwrap_err();
        assert!(matches!(
            err,
            VolumeError::ShapeMismatch {
                expected: (2, 2, 2),
                found: (2, 2, 3)
            }
        ));
    }

    #[test]
    fn test_into_zhw_drops_trailing_singleton() {
        // [W, H, z, t] = [3, 2, 1, 1], 按 Fortran 序排列 0..6.
        let raw = ndarray::Array::from_shape_vec(
            ndarray::IxDyn(&[3, 2, 1, 1]).f(),
            (0u8..6).collect::<Vec<_>>(),
        )
        .unwrap();
        let zhw = into_zhw(raw).unwrap();
        assert_eq!(zhw.dim(), (1, 2, 3));
        assert!(zhw.is_standard_layout());
        assert_eq!(zhw[(0, 0, 2)], 2);
        assert_eq!(zhw[(0, 1, 0)], 3);
    }

    #[test]
    fn test_into_zhw_rejects_time_series() {
        let raw = ArrayD::<u8>::zeros(ndarray::IxDyn(&[2, 2, 2, 3]));
        assert!(matches!(into_zhw(raw), Err(VolumeError::NotVolumetric(_))));
    }
}
