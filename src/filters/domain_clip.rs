// filters/domain_clip.rs

use super::{Filter, FilterContext};
use crate::error::{BespinError, Result};
use crate::obs::ObsSpace;

pub(super) const NAME: &str = "domain_clip";
const LATITUDE: &str = "latitude";
const LONGITUDE: &str = "longitude";

/// Keep only the observations inside a lat/lon polygon,
/// `domain_clip:<lat>,<lon>:<lat>,<lon>:...` (at least 3 vertices).
///
/// Negative vertex longitudes are wrapped to [0, 360), to match the obs
/// after `lon_wrap`. Polygons crossing the 0/360 meridian aren't handled.
#[derive(Clone, Debug)]
pub struct DomainClip {
    vertices: Vec<(f64, f64)>,
}

impl DomainClip {
    pub fn new(vertices: Vec<(f64, f64)>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(BespinError::InvalidFilter {
                filter: NAME.to_string(),
                reason: format!("a domain needs at least 3 points, found {}", vertices.len()),
            });
        }
        let vertices = vertices
            .into_iter()
            .map(|(lat, lon)| (lat, if lon < 0.0 { lon + 360.0 } else { lon }))
            .collect();
        Ok(Self { vertices })
    }

    pub fn from_args(args: &[&str]) -> Result<Self> {
        let vertices = args
            .iter()
            .map(|arg| {
                let invalid = || BespinError::InvalidFilter {
                    filter: NAME.to_string(),
                    reason: format!("invalid point \"{}\", expected <lat>,<lon>", arg),
                };
                let (lat, lon) = arg.split_once(',').ok_or_else(invalid)?;
                Ok((
                    lat.trim().parse::<f64>().map_err(|_| invalid())?,
                    lon.trim().parse::<f64>().map_err(|_| invalid())?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(vertices)
    }

    /// Whether the point lies on an edge (or vertex) of the polygon.
    fn on_boundary(&self, lat: f64, lon: f64) -> bool {
        let n = self.vertices.len();
        (0..n).any(|i| {
            let (y1, x1) = self.vertices[i];
            let (y2, x2) = self.vertices[(i + 1) % n];
            let cross = (x2 - x1) * (lat - y1) - (y2 - y1) * (lon - x1);
            cross.abs() <= f64::EPSILON * (x2 - x1).abs().max((y2 - y1).abs()).max(1.0)
                && lon >= x1.min(x2)
                && lon <= x1.max(x2)
                && lat >= y1.min(y2)
                && lat <= y1.max(y2)
        })
    }

    /// Whether the point is strictly inside the polygon. Points on its
    /// boundary are outside.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if self.on_boundary(lat, lon) {
            return false;
        }
        let mut inside = false;
        let n = self.vertices.len();
        for i in 0..n {
            let (yi, xi) = self.vertices[i];
            let (yj, xj) = self.vertices[(i + n - 1) % n];
            if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                inside = !inside;
            }
        }
        inside
    }
}

impl Filter for DomainClip {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, obs: &mut ObsSpace, _ctx: &FilterContext) -> Result<()> {
        let lats = obs.require(LATITUDE)?.values();
        let lons = obs.require(LONGITUDE)?.values();
        let keep: Vec<bool> = lats
            .iter()
            .zip(lons)
            .map(|(lat, lon)| self.contains(*lat, *lon))
            .collect();
        obs.retain_locations(&keep)
    }
}
