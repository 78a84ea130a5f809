//! ONNX Runtime model backend.
//!
//! Loads a policy/value network exported by the trainer and exposes it as a
//! [`Model`] instance for the batching layer.
//!
//! Expected graph signature:
//! - Input `"observation"`: `(batch, state_size)` float32
//! - Output `"priors"`: `(batch, prior_size)` float32
//! - Output `"value"`: `(batch, 1)` float32

use std::path::Path;
use std::sync::Mutex;

use ort::{session::Session, value::Value};
use tracing::info;

use crate::evaluator::EvaluatorError;
use crate::model::{Model, ModelOutput};

/// ONNX-backed model instance.
///
/// `Session::run` needs `&mut self`, so the session sits behind a mutex;
/// the batching layer gives each instance at most one batch at a time, so
/// the lock is uncontended in practice.
pub struct OnnxModel {
    session: Mutex<Session>,
    batch_size: usize,
    rows: i32,
    columns: i32,
    move_prior_size: usize,
}

impl OnnxModel {
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        batch_size: usize,
        rows: i32,
        columns: i32,
        move_prior_size: usize,
    ) -> Result<Self, EvaluatorError> {
        let session = Session::builder()
            .map_err(|e| EvaluatorError::ModelError(format!("session builder: {e}")))?
            .with_intra_threads(1)
            .map_err(|e| EvaluatorError::ModelError(format!("intra threads: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| EvaluatorError::ModelError(format!("loading model: {e}")))?;

        info!(
            path = %model_path.as_ref().display(),
            rows,
            columns,
            "loaded ONNX model"
        );

        Ok(Self {
            session: Mutex::new(session),
            batch_size,
            rows,
            columns,
            move_prior_size,
        })
    }
}

impl Model for OnnxModel {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn rows(&self) -> i32 {
        self.rows
    }

    fn columns(&self) -> i32 {
        self.columns
    }

    fn move_prior_size(&self) -> usize {
        self.move_prior_size
    }

    fn run_batch(&self, inputs: &[f32], count: usize) -> Result<ModelOutput, EvaluatorError> {
        if inputs.len() != count * self.state_size() {
            return Err(EvaluatorError::InvalidState(format!(
                "expected {} input floats, got {}",
                count * self.state_size(),
                inputs.len()
            )));
        }

        let input_array =
            ndarray::Array2::from_shape_vec((count, self.state_size()), inputs.to_vec())
                .map_err(|e| EvaluatorError::InvalidState(format!("input array: {e}")))?;
        let input_value = Value::from_array(input_array)
            .map_err(|e| EvaluatorError::ModelError(format!("input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EvaluatorError::EvaluationFailed(format!("session lock: {e}")))?;
        let outputs = session
            .run(ort::inputs!["observation" => input_value])
            .map_err(|e| EvaluatorError::EvaluationFailed(format!("inference: {e}")))?;

        let priors_output = outputs
            .get("priors")
            .ok_or_else(|| EvaluatorError::ModelError("missing 'priors' output".into()))?;
        let (_, priors) = priors_output
            .try_extract_tensor::<f32>()
            .map_err(|e| EvaluatorError::ModelError(format!("priors tensor: {e}")))?;

        let value_output = outputs
            .get("value")
            .ok_or_else(|| EvaluatorError::ModelError("missing 'value' output".into()))?;
        let (_, values) = value_output
            .try_extract_tensor::<f32>()
            .map_err(|e| EvaluatorError::ModelError(format!("value tensor: {e}")))?;

        let expected_priors = count * self.prior_size();
        if priors.len() != expected_priors || values.len() != count {
            return Err(EvaluatorError::ModelError(format!(
                "output shape mismatch: {} priors / {} values for batch of {}",
                priors.len(),
                values.len(),
                count
            )));
        }

        Ok(ModelOutput {
            values: values.to_vec(),
            priors: priors.to_vec(),
        })
    }
}
