// world/section.rs - cross-section evaluation with rayon parallelism
//
// Samples a 2-D world over a regular (along, depth) grid. Each sample is taken
// at the cell centre; the query point is `(along, surface - depth)`. Rows
// (one depth each) are evaluated in parallel.

use super::World;
use crate::error::{Result, WorldBuilderError};
use crate::point::Point;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionRequest {
    /// Samples along the cross section.
    pub resolution_along: u32,
    /// Samples in depth.
    pub resolution_depth: u32,
    pub along_min: f64,
    pub along_max: f64,
    pub depth_min: f64,
    pub depth_max: f64,
    /// Vertical coordinate of the surface.
    pub surface: f64,
    pub gravity: f64,
}

impl Default for SectionRequest {
    fn default() -> Self {
        SectionRequest {
            resolution_along: 64,
            resolution_depth: 64,
            along_min: 0.0,
            along_max: 1000e3,
            depth_min: 0.0,
            depth_max: 660e3,
            surface: 0.0,
            gravity: 9.81,
        }
    }
}

impl SectionRequest {
    fn along_step(&self) -> f64 {
        (self.along_max - self.along_min) / self.resolution_along as f64
    }

    fn depth_step(&self) -> f64 {
        (self.depth_max - self.depth_min) / self.resolution_depth as f64
    }

    fn along_at(&self, i: usize) -> f64 {
        self.along_min + (i as f64 + 0.5) * self.along_step()
    }

    fn depth_at(&self, j: usize) -> f64 {
        self.depth_min + (j as f64 + 0.5) * self.depth_step()
    }
}

/// Temperatures over a section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionResult {
    /// Row-major, one row per depth sample, shallowest first.
    /// Length = resolution_along × resolution_depth.
    pub values: Vec<f64>,
    pub resolution_along: u32,
    pub resolution_depth: u32,
    pub min_value: f64,
    pub max_value: f64,
}

/// Presence of one composition over a section, same layout as
/// [`SectionResult`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSectionResult {
    pub values: Vec<bool>,
    pub resolution_along: u32,
    pub resolution_depth: u32,
    pub composition_number: u32,
    /// Number of samples where the composition is present.
    pub present: usize,
}

fn check_request(world: &World, request: &SectionRequest) -> Result<()> {
    if world.dim() != 2 {
        return Err(WorldBuilderError::ModeError {
            message: "section evaluation needs a cross section".to_string(),
        });
    }
    if request.resolution_along == 0 || request.resolution_depth == 0 {
        return Err(WorldBuilderError::config(
            "section",
            "resolutions must be positive",
        ));
    }
    Ok(())
}

/// Evaluate `f(point, depth)` for every sample, rows in parallel.
fn evaluate_rows<T, F>(request: &SectionRequest, f: F) -> Result<Vec<Vec<T>>>
where
    T: Send,
    F: Fn(Point<2>, f64) -> Result<T> + Sync,
{
    let n_along = request.resolution_along as usize;
    (0..request.resolution_depth as usize)
        .into_par_iter()
        .map(|j| {
            let depth = request.depth_at(j);
            let z = request.surface - depth;
            (0..n_along)
                .map(|i| f(Point::new([request.along_at(i), z]), depth))
                .collect::<Result<Vec<T>>>()
        })
        .collect()
}

pub fn evaluate_temperature_section(
    world: &World,
    request: &SectionRequest,
) -> Result<SectionResult> {
    check_request(world, request)?;
    let rows = evaluate_rows(request, |point, depth| {
        world.temperature(point, depth, request.gravity)
    })?;

    let mut values = Vec::with_capacity(request.resolution_along as usize * rows.len());
    let mut min_value = f64::MAX;
    let mut max_value = f64::MIN;
    for row in rows {
        for &v in &row {
            min_value = min_value.min(v);
            max_value = max_value.max(v);
        }
        values.extend(row);
    }

    Ok(SectionResult {
        values,
        resolution_along: request.resolution_along,
        resolution_depth: request.resolution_depth,
        min_value,
        max_value,
    })
}

pub fn evaluate_composition_section(
    world: &World,
    request: &SectionRequest,
    composition_number: u32,
) -> Result<CompositionSectionResult> {
    check_request(world, request)?;
    let values: Vec<bool> = evaluate_rows(request, |point, depth| {
        world.composition(point, depth, composition_number)
    })?
    .into_iter()
    .flatten()
    .collect();
    let present = values.iter().filter(|&&v| v).count();

    Ok(CompositionSectionResult {
        values,
        resolution_along: request.resolution_along,
        resolution_depth: request.resolution_depth,
        composition_number,
        present,
    })
}
