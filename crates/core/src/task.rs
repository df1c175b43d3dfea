//! Task variants and the per-variant model contract table.
//!
//! Each restoration task in the family fixes the model's channel count and
//! spatial window; the JPEG variant uses window 7 because JPEG encodes in
//! 8x8 blocks, every other variant uses window 8.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::restore::RestoreContract;

/// Restoration task variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    ClassicalSr,
    LightweightSr,
    RealSr,
    GrayDn,
    ColorDn,
    JpegCar,
}

impl Task {
    pub const ALL: [Task; 6] = [
        Task::ClassicalSr,
        Task::LightweightSr,
        Task::RealSr,
        Task::GrayDn,
        Task::ColorDn,
        Task::JpegCar,
    ];

    /// Model contract for this task. `scale` only applies to the scalable
    /// super-resolution variants; real-world SR is fixed at x4 and the
    /// denoising/JPEG variants are always scale 1.
    pub fn contract(self, scale: usize) -> RestoreContract {
        match self {
            Task::ClassicalSr | Task::LightweightSr => RestoreContract::new(3, 8, scale),
            Task::RealSr => RestoreContract::new(3, 8, 4),
            Task::GrayDn => RestoreContract::new(1, 8, 1),
            Task::ColorDn => RestoreContract::new(3, 8, 1),
            Task::JpegCar => RestoreContract::new(1, 7, 1),
        }
    }

    /// Border cropped before metric computation by the surrounding
    /// reporting tooling. Kept in the table because the original couples it
    /// to the variant.
    pub fn metric_border(self, scale: usize) -> usize {
        match self {
            Task::ClassicalSr | Task::LightweightSr => scale,
            _ => 0,
        }
    }

    /// Whether this task synthesizes its degraded input with Gaussian noise.
    pub fn is_denoise(self) -> bool {
        matches!(self, Task::GrayDn | Task::ColorDn)
    }

    /// Conventional model-zoo weight file name for this variant.
    pub fn weight_file(self, scale: usize, noise: u32, jpeg: u32, large: bool) -> String {
        match self {
            Task::ClassicalSr => {
                format!("001_classicalSR_DF2K_s64w8_SwinIR-M_x{scale}.onnx")
            }
            Task::LightweightSr => {
                format!("002_lightweightSR_DIV2K_s64w8_SwinIR-S_x{scale}.onnx")
            }
            Task::RealSr => {
                if large {
                    "003_realSR_BSRGAN_DFOWMFC_s64w8_SwinIR-L_x4_GAN.onnx".to_string()
                } else {
                    "003_realSR_BSRGAN_DFO_s64w8_SwinIR-M_x4_GAN.onnx".to_string()
                }
            }
            Task::GrayDn => format!("004_grayDN_DFWB_s128w8_SwinIR-M_noise{noise}.onnx"),
            Task::ColorDn => format!("005_colorDN_DFWB_s128w8_SwinIR-M_noise{noise}.onnx"),
            Task::JpegCar => format!("006_CAR_DFWB_s126w7_SwinIR-M_jpeg{jpeg}.onnx"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Task::ClassicalSr => "classical_sr",
            Task::LightweightSr => "lightweight_sr",
            Task::RealSr => "real_sr",
            Task::GrayDn => "gray_dn",
            Task::ColorDn => "color_dn",
            Task::JpegCar => "jpeg_car",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "classical_sr" => Ok(Task::ClassicalSr),
            "lightweight_sr" => Ok(Task::LightweightSr),
            "real_sr" => Ok(Task::RealSr),
            "gray_dn" => Ok(Task::GrayDn),
            "color_dn" => Ok(Task::ColorDn),
            "jpeg_car" => Ok(Task::JpegCar),
            other => bail!(
                "unknown task '{other}' (expected one of classical_sr, lightweight_sr, \
                 real_sr, gray_dn, color_dn, jpeg_car)"
            ),
        }
    }
}

/// Optional on-disk roster mapping task names to model paths, so batch
/// scripts don't have to repeat `--model` per invocation.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ModelRoster {
    #[serde(default)]
    pub models: BTreeMap<String, PathBuf>,
}

impl ModelRoster {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("parsing model roster")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading model roster {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    pub fn model_for(&self, task: Task) -> Option<&Path> {
        self.models.get(task.as_str()).map(PathBuf::as_path)
    }
}
