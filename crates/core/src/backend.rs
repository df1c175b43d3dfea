//! ONNX Runtime restorer: the concrete [`Restorer`] behind the drivers in
//! production runs.
//!
//! Session setup is deliberately minimal — graph optimization level 3 and
//! whatever execution provider the dynamically loaded runtime offers.
//! Device placement policy stays with the runtime.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array3, ArrayView3};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tracing::{debug, info};

use crate::restore::{RestoreContract, Restorer};

pub struct OrtRestorer {
    session: Session,
    input_name: String,
    output_name: String,
    contract: RestoreContract,
}

impl OrtRestorer {
    /// Load a session from `model_path` and bind it to `contract`.
    ///
    /// Input/output tensor names are taken from the model metadata, first
    /// entry each — the models of this family are single-input,
    /// single-output.
    pub fn load(model_path: &Path, contract: RestoreContract) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)
            .with_context(|| format!("loading model {}", model_path.display()))?;

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| anyhow!("model {} declares no inputs", model_path.display()))?;
        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .ok_or_else(|| anyhow!("model {} declares no outputs", model_path.display()))?;

        info!(
            model = %model_path.display(),
            input = %input_name,
            output = %output_name,
            "restoration session ready"
        );

        Ok(Self {
            session,
            input_name,
            output_name,
            contract,
        })
    }
}

impl Restorer for OrtRestorer {
    fn contract(&self) -> RestoreContract {
        self.contract
    }

    fn restore(&mut self, input: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        self.contract.check_input(&input)?;
        let (channels, height, width) = input.dim();
        debug!(channels, height, width, "running restoration inference");

        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_array(([1, channels, height, width], data))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => &tensor])?;
        let (shape, raw) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        let (out_c, out_h, out_w) = squeeze_output_dims(&dims)?;

        let expected_h = height * self.contract.scale;
        let expected_w = width * self.contract.scale;
        if out_h != expected_h || out_w != expected_w {
            bail!(
                "model returned {out_c}x{out_h}x{out_w} for a {channels}x{height}x{width} \
                 input at scale {}",
                self.contract.scale
            );
        }

        Array3::from_shape_vec((out_c, out_h, out_w), raw.to_vec())
            .context("reshaping model output")
    }
}

/// Strip the singleton batch dimension from a model output shape.
fn squeeze_output_dims(dims: &[usize]) -> Result<(usize, usize, usize)> {
    match dims {
        [1, c, h, w] => Ok((*c, *h, *w)),
        [c, h, w] => Ok((*c, *h, *w)),
        other => bail!("model returned unexpected output shape {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squeeze_output_dims() {
        assert_eq!(squeeze_output_dims(&[1, 3, 16, 16]).unwrap(), (3, 16, 16));
        assert_eq!(squeeze_output_dims(&[1, 32, 32]).unwrap(), (1, 32, 32));
        assert!(squeeze_output_dims(&[2, 3, 16, 16]).is_err());
        assert!(squeeze_output_dims(&[16, 16]).is_err());
    }
}
