//! Multi-shell constellation with a contiguous element array

use crate::constants::BodyConstants;
use crate::propagation::{propagate_j2, EpochSequence, Trajectory};
use crate::walker::{OrbitalElement, WalkerShell};
use crate::{OrbitalError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where a satellite sits inside its shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteSlot {
    pub shell: usize,
    pub plane: usize,
    pub slot: usize,
}

/// Ordered Walker shells plus one element per satellite.
///
/// Satellite identity is the index into [`Constellation::elements`]; shells
/// occupy consecutive slices in shell order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constellation {
    shells: Vec<WalkerShell>,
    elements: Vec<OrbitalElement>,
    /// Start index of each shell's slice
    offsets: Vec<usize>,
}

impl Constellation {
    /// Validate every shell, then generate elements shell by shell.
    pub fn new(shells: Vec<WalkerShell>, constants: &BodyConstants) -> Result<Self> {
        if shells.is_empty() {
            return Err(OrbitalError::InvalidShell("constellation has no shells".to_string()));
        }
        constants.validate()?;
        for shell in &shells {
            shell.validate()?;
        }

        let total: usize = shells.iter().map(WalkerShell::satellite_count).sum();
        let mut elements = Vec::with_capacity(total);
        let mut offsets = Vec::with_capacity(shells.len());

        for shell in &shells {
            offsets.push(elements.len());
            elements.extend(shell.initial_elements(constants)?);
        }

        info!(
            "Built constellation: {} shells, {} satellites",
            shells.len(),
            elements.len()
        );

        Ok(Self {
            shells,
            elements,
            offsets,
        })
    }

    pub fn shells(&self) -> &[WalkerShell] {
        &self.shells
    }

    pub fn elements(&self) -> &[OrbitalElement] {
        &self.elements
    }

    pub fn satellite_count(&self) -> usize {
        self.elements.len()
    }

    /// Elements belonging to one shell.
    pub fn shell_elements(&self, shell: usize) -> Option<&[OrbitalElement]> {
        let start = *self.offsets.get(shell)?;
        let end = start + self.shells[shell].satellite_count();
        Some(&self.elements[start..end])
    }

    /// Shell, plane and in-plane slot of a satellite index.
    pub fn locate(&self, satellite: usize) -> Option<SatelliteSlot> {
        if satellite >= self.elements.len() {
            return None;
        }
        let shell = self.offsets.partition_point(|&start| start <= satellite) - 1;
        let local = satellite - self.offsets[shell];
        let per_plane = self.shells[shell].sats_per_plane as usize;
        Some(SatelliteSlot {
            shell,
            plane: local / per_plane,
            slot: local % per_plane,
        })
    }

    pub fn propagate(&self, epochs: &EpochSequence, constants: &BodyConstants) -> Result<Trajectory> {
        propagate_j2(&self.elements, epochs, constants)
    }
}
