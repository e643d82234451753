//! Procedural beat-timed path: an ordered node sequence accumulated from
//! declarative per-node records.

use crate::error::{OrbitError, Result};
use crate::utils::{normalize_degrees, polar_degrees, range_map};
use cgmath::{InnerSpace, Vector2};
use log::{info, warn};
use serde::Deserialize;
use std::path::Path as FsPath;

/// Squared-length cutoff under which the summed in/out normals count as
/// antiparallel, i.e. a full-reversal node.
const FULL_REVERSAL_EPSILON: f32 = 0.001;

/// Declarative per-node record. The first record implicitly defines node 0.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    /// Beats between the previous node and this one. Also drives the turn
    /// angle: 2 beats maps to -180 degrees, 0 beats to +180.
    pub beat: f32,
    /// Speed multiplier; inherited from the previous node when absent.
    pub speed: Option<f32>,
    /// Toggles the orbit direction relative to the previous node.
    #[serde(default)]
    pub spin: bool,
    /// Marks this node as a resume point after a fail.
    #[serde(default)]
    pub checkpoint: bool,
}

/// Declarative path description, loadable from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct PathSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default = "PathSpec::default_width")]
    pub width: f32,
    #[serde(default = "PathSpec::default_scale")]
    pub scale: f32,
    pub nodes: Vec<NodeSpec>,
}

impl PathSpec {
    fn default_width() -> f32 {
        0.8
    }

    fn default_scale() -> f32 {
        1.0
    }

    pub fn load_from_file(path: impl AsRef<FsPath>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            OrbitError::PathSpec(path.display().to_string(), format!("failed to read: {}", e))
        })?;
        let spec: PathSpec = serde_json::from_str(&text).map_err(|e| {
            OrbitError::PathSpec(path.display().to_string(), format!("failed to parse: {}", e))
        })?;
        if spec.nodes.is_empty() {
            return Err(OrbitError::PathSpec(
                path.display().to_string(),
                "path has no nodes".to_string(),
            ));
        }
        Ok(spec)
    }
}

/// Outline points for one node's road segment, handed to the external
/// renderer. `corner_left`/`corner_right` are the mitered elbow points; for
/// a full-reversal node they collapse to a symmetric cap around the center.
#[derive(Debug, Clone, Copy)]
pub struct NodeOutline {
    pub in_left: Vector2<f32>,
    pub in_right: Vector2<f32>,
    pub corner_left: Vector2<f32>,
    pub corner_right: Vector2<f32>,
    pub out_left: Vector2<f32>,
    pub out_right: Vector2<f32>,
    pub full_reversal: bool,
}

#[derive(Debug, Clone)]
pub struct PathNode {
    pub position: Vector2<f32>,
    /// Absolute outgoing-tangent angle in degrees.
    pub angle: f32,
    /// Absolute beat at which the player should arrive here.
    pub time_in_beats: f64,
    /// Speed-scaled beats spent travelling to this node.
    pub duration_in_beats: f32,
    pub speed: f32,
    pub clockwise: bool,
    pub checkpoint: bool,
    pub radius: f32,
    pub outline: NodeOutline,
}

pub struct Path {
    nodes: Vec<PathNode>,
    name: String,
    width: f32,
    scale: f32,
    total_beats: f64,
}

impl Path {
    /// Builds the node sequence from a declarative spec. Node 0 sits at the
    /// origin facing the reference direction; every later node accumulates
    /// the previous node's transform.
    pub fn build(spec: &PathSpec) -> Self {
        let mut path = Self {
            nodes: Vec::with_capacity(spec.nodes.len()),
            name: spec.name.clone(),
            width: spec.width,
            scale: spec.scale,
            total_beats: 0.0,
        };

        for node_spec in &spec.nodes {
            path.add_node(node_spec);
        }

        info!(
            "Built path \"{}\": {} nodes over {:.2} beats.",
            path.name,
            path.nodes.len(),
            path.total_beats
        );
        path
    }

    pub fn load_from_file(file: impl AsRef<FsPath>) -> Result<Self> {
        let spec = PathSpec::load_from_file(file)?;
        Ok(Self::build(&spec))
    }

    fn add_node(&mut self, spec: &NodeSpec) {
        let radius = 0.5 * self.scale;
        let delta_angle = range_map(spec.beat, 2.0, 0.0, -180.0, 180.0);

        if self.nodes.is_empty() {
            let out_normal = polar_degrees(delta_angle, 1.0);
            self.nodes.push(PathNode {
                position: Vector2::new(0.0, 0.0),
                angle: 0.0,
                time_in_beats: 0.0,
                duration_in_beats: spec.beat,
                speed: spec.speed.unwrap_or(1.0),
                clockwise: true,
                checkpoint: spec.checkpoint,
                radius,
                outline: Self::outline(
                    Vector2::new(0.0, 0.0),
                    Vector2::new(1.0, 0.0),
                    out_normal,
                    radius,
                    self.width,
                ),
            });
            return;
        }

        if delta_angle.abs() > 360.0 {
            // Known desync hazard; built uncorrected on purpose.
            warn!(
                "Path \"{}\" node {} turns {:.1} degrees, over the 360 limit.",
                self.name,
                self.nodes.len(),
                delta_angle
            );
        }

        let prev = self.nodes.last().expect("non-empty");
        let speed = spec.speed.unwrap_or(prev.speed);
        let duration = if speed > 0.0 { spec.beat / speed } else { spec.beat };

        let clockwise = if spec.spin { !prev.clockwise } else { prev.clockwise };
        let turn_direction = if clockwise { 1.0 } else { -1.0 };
        let angle = normalize_degrees(prev.angle + turn_direction * delta_angle);

        let in_direction = polar_degrees(prev.angle, 1.0);
        let position = prev.position + in_direction * self.scale;
        let out_direction = polar_degrees(angle, 1.0);

        self.total_beats += duration as f64;
        self.nodes.push(PathNode {
            position,
            angle,
            time_in_beats: self.total_beats,
            duration_in_beats: duration,
            speed,
            clockwise,
            checkpoint: spec.checkpoint,
            radius,
            outline: Self::outline(position, in_direction, out_direction, radius, self.width),
        });
    }

    /// Road-segment outline around a node. The general case miters the
    /// in/out quads at the corner; antiparallel tangents would divide by a
    /// near-zero center distance, so that case falls back to a symmetric
    /// cap around the node center.
    fn outline(
        center: Vector2<f32>,
        in_normal: Vector2<f32>,
        out_normal: Vector2<f32>,
        radius: f32,
        width: f32,
    ) -> NodeOutline {
        let half_width = 0.5 * width;
        let rotate_90 = |v: Vector2<f32>| Vector2::new(-v.y, v.x);

        let in_tangent = rotate_90(in_normal);
        let out_tangent = rotate_90(out_normal);

        let in_center = center - in_normal * radius;
        let in_left = in_center + in_tangent * half_width;
        let in_right = in_center - in_tangent * half_width;

        let out_center = center + out_normal * radius;
        let out_left = out_center + out_tangent * half_width;
        let out_right = out_center - out_tangent * half_width;

        let full_reversal = (in_normal + out_normal).magnitude2() < FULL_REVERSAL_EPSILON;
        if full_reversal {
            // Symmetric geometry around the center; the mitering formula
            // below would divide by a near-zero center distance.
            let center_left = center + in_tangent * half_width;
            let center_right = center - in_tangent * half_width;
            return NodeOutline {
                in_left,
                in_right,
                corner_left: center_left,
                corner_right: center_right,
                out_left,
                out_right,
                full_reversal,
            };
        }

        let center_distance = (out_center - in_center).magnitude();
        let ratio = radius / center_distance;
        let left_length = (out_left - in_left).magnitude() * ratio;
        let right_length = (out_right - in_right).magnitude() * ratio;

        NodeOutline {
            in_left,
            in_right,
            corner_left: in_left + in_normal * left_length,
            corner_right: in_right + in_normal * right_length,
            out_left,
            out_right,
            full_reversal,
        }
    }

    /// Node at `index`, or `None` out of bounds. Negative indices are used
    /// by the player for "no previous node yet".
    pub fn node(&self, index: i32) -> Option<&PathNode> {
        if index < 0 {
            return None;
        }
        self.nodes.get(index as usize)
    }

    pub fn last_node(&self) -> Option<&PathNode> {
        self.nodes.last()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_beats(&self) -> f64 {
        self.total_beats
    }
}
