use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StructureError {
    #[error("Confidence track length {confidences} does not match residue count {residues}")]
    ConfidenceMismatch { residues: usize, confidences: usize },
}

/// A per-residue structure estimate returned by the folding model.
///
/// Carries one Cα position and one pLDDT value (0–100) per residue, plus an
/// optional whole-assembly pTM score (0–1) for models that emit one.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    ca_positions: Vec<Point3<f64>>,
    plddt: Vec<f64>,
    ptm: Option<f64>,
}

impl Structure {
    pub fn new(ca_positions: Vec<Point3<f64>>, plddt: Vec<f64>) -> Result<Self, StructureError> {
        if ca_positions.len() != plddt.len() {
            return Err(StructureError::ConfidenceMismatch {
                residues: ca_positions.len(),
                confidences: plddt.len(),
            });
        }
        Ok(Self {
            ca_positions,
            plddt,
            ptm: None,
        })
    }

    pub fn with_ptm(mut self, ptm: f64) -> Self {
        self.ptm = Some(ptm);
        self
    }

    pub fn len(&self) -> usize {
        self.ca_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ca_positions.is_empty()
    }

    pub fn ca_positions(&self) -> &[Point3<f64>] {
        &self.ca_positions
    }

    pub fn plddt(&self) -> &[f64] {
        &self.plddt
    }

    pub fn ptm(&self) -> Option<f64> {
        self.ptm
    }

    /// Mean pLDDT over the whole chain; 0 for an empty structure.
    pub fn mean_plddt(&self) -> f64 {
        if self.plddt.is_empty() {
            return 0.0;
        }
        self.plddt.iter().sum::<f64>() / self.plddt.len() as f64
    }
}
