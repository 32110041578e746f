//! A tract-onnx classifier implementing the drover engine contract.
//!
//! The model is loaded once at startup with a symbolic leading batch
//! dimension, so one optimized plan serves every batch size the
//! dispatcher assembles. The model is expected to end in a softmax:
//! output rows are taken as probabilities as-is.

use anyhow::{bail, Context, Result};
use drover_core::prelude::{Batch, Engine, Prediction, TensorShape};
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};
use tract_onnx::prelude::*;

/// A classification engine backed by an optimized tract plan.
pub struct OnnxClassifier {
    plan: TypedSimplePlan<TypedModel>,
    shape: TensorShape,
    labels: Vec<String>,
    top_k: usize,
}

impl OnnxClassifier {
    /// Build a classifier from ONNX data, pinning the input fact to
    /// `f32 × [N, height, width, channels]` with `N` symbolic.
    pub fn from_read(
        reader: &mut dyn Read,
        shape: TensorShape,
        labels: Vec<String>,
        top_k: usize,
    ) -> Result<Self> {
        let mut model = tract_onnx::onnx().model_for_read(reader)?;

        let outlets = model.output_outlets()?.len();
        for output in 0..outlets {
            model.set_output_fact(output, Default::default())?;
        }

        let symbol = model.symbols.sym("N");
        let mut full_shape = tvec!(symbol.to_dim());
        full_shape.extend(shape.dims().iter().map(|v| (*v as i32).into()));
        model.set_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), full_shape))?;

        let plan = model
            .into_typed()?
            .into_decluttered()?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self {
            plan,
            shape,
            labels,
            top_k: top_k.max(1),
        })
    }

    /// Build a classifier from a model file and a labels file.
    pub fn from_paths(
        model: impl AsRef<Path>,
        labels: impl AsRef<Path>,
        shape: TensorShape,
        top_k: usize,
    ) -> Result<Self> {
        let labels = load_labels(labels.as_ref())?;
        let mut reader = File::open(model.as_ref())
            .with_context(|| format!("opening model {:?}", model.as_ref()))?;

        Self::from_read(&mut reader, shape, labels, top_k)
    }
}

impl Engine for OnnxClassifier {
    fn infer(&mut self, batch: &Batch) -> Result<Vec<Vec<Prediction>>> {
        let count = batch.len();
        let [height, width, channels] = batch.shape().dims();

        let input = Tensor::from_shape(&[count, height, width, channels], batch.data())?;
        let outputs = self.plan.run(tvec!(input.into_tvalue()))?;

        let scores = outputs[0].as_slice::<f32>()?;
        if scores.len() % count != 0 {
            bail!(
                "output length {} is not a multiple of batch size {}",
                scores.len(),
                count
            );
        }

        let classes = scores.len() / count;
        Ok(scores
            .chunks_exact(classes)
            .map(|row| rank_top_k(row, self.top_k, &self.labels))
            .collect())
    }

    fn input_shape(&self) -> TensorShape {
        self.shape
    }
}

/// Read a labels file: one label per line, class index by line number,
/// blank lines skipped.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening labels {:?}", path))?;
    parse_labels(BufReader::new(file))
}

fn parse_labels(reader: impl BufRead) -> Result<Vec<String>> {
    let mut labels = vec![];
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            labels.push(line.to_owned());
        }
    }

    Ok(labels)
}

/// Pick the `top_k` highest-scoring classes, best-first. Classes past
/// the end of the labels file fall back to an index name.
fn rank_top_k(row: &[f32], top_k: usize, labels: &[String]) -> Vec<Prediction> {
    let mut ranked: Vec<usize> = (0..row.len()).collect();
    ranked.sort_by(|a, b| {
        row[*b]
            .partial_cmp(&row[*a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
        .into_iter()
        .take(top_k)
        .map(|index| Prediction {
            label: labels
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", index)),
            probability: row[index],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_labels, rank_top_k};

    #[test]
    fn parses_labels_skipping_blanks() {
        let data = "tabby\n\nsiamese\n  persian  \n";
        let labels = parse_labels(data.as_bytes()).unwrap();
        assert_eq!(labels, vec!["tabby", "siamese", "persian"]);
    }

    #[test]
    fn ranks_best_first() {
        let labels = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
        let preds = rank_top_k(&[0.1, 0.7, 0.2], 2, &labels);

        assert_eq!(preds.len(), 2);
        assert_eq!(preds[0].label, "b");
        assert!((preds[0].probability - 0.7).abs() < 1e-6);
        assert_eq!(preds[1].label, "c");
    }

    #[test]
    fn falls_back_to_index_names() {
        let labels = vec!["a".to_owned()];
        let preds = rank_top_k(&[0.2, 0.8], 1, &labels);

        assert_eq!(preds[0].label, "class_1");
    }
}
