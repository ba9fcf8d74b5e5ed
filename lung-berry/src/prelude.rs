//! 🫁欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::data::{CtLabel, CtScan, NiftiHeaderAttr, NiftiSave, VolumeError};

pub use crate::bids::{BidsEntity, BidsOutputs, ResolveError};

pub use crate::consts::gray::{LABEL_BACKGROUND, LABEL_FOREGROUND};
pub use crate::consts::NOT_AVAILABLE;

pub use crate::emphysema::{self, EmphysemaAnalysis, EmphysemaError, EmphysemaScores};

pub use crate::segment::{LungmaskCommand, SegmentError, SegmentationKind, Segmenter};
