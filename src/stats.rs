// src/stats.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::binned::BinnedStatistics;
use crate::statistic::StatKind;

/// A summary of how observations are spread over the bins.
#[derive(Debug, Serialize, Deserialize)]
pub struct BinnedSummary {
    pub name: String,
    pub window_start: Option<String>,
    pub window_end: Option<String>,

    pub dimensions: Vec<DimensionSummary>,
    pub sliced_dims: Vec<(String, f64)>,
    pub channels: Option<Vec<i64>>,
    pub diagnostics: Vec<String>,
    pub total_possible_bins: usize,

    // Per variable/diagnostic occupancy, for those with counts
    pub occupancy: Vec<OccupancySummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DimensionSummary {
    pub name: String,
    pub units: Option<String>,
    pub bins: usize,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OccupancySummary {
    pub variable: String,
    pub diagnostic: String,
    pub total_count: u64,
    pub bins_used: usize,
    pub total_bins: usize,
    pub utilization: f64, // percentage of bins with any obs
    pub min_count: u64,   // over the used bins
    pub max_count: u64,
    pub mean_count: f64,
    pub count_histogram: BTreeMap<u32, usize>, // log2 count bucket -> bins
}

impl BinnedSummary {
    /// Summarize binned statistics.
    pub fn analyze(binned: &BinnedStatistics) -> Self {
        let dimensions = binned
            .bins()
            .iter()
            .map(|d| {
                let (lower, upper) = d.bounds();
                DimensionSummary {
                    name: d.name.clone(),
                    units: d.units.clone(),
                    bins: d.len(),
                    lower,
                    upper,
                }
            })
            .collect();

        let mut occupancy = Vec::new();
        for variable in binned.variable_names() {
            for diag in binned.diagnostics() {
                let Some(counts) = binned.field(variable, &diag.name, StatKind::Count) else {
                    continue;
                };
                occupancy.push(Self::calculate_occupancy(variable, &diag.name, counts));
            }
        }

        Self {
            name: binned.name.clone(),
            window_start: binned.window_start.map(|t| t.to_rfc3339()),
            window_end: binned.window_end.map(|t| t.to_rfc3339()),
            dimensions,
            sliced_dims: binned
                .sliced_dims()
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            channels: binned.channels().map(<[i64]>::to_vec),
            diagnostics: binned.diagnostics().iter().map(|d| d.to_string()).collect(),
            total_possible_bins: binned.shape().iter().product(),
            occupancy,
        }
    }

    fn calculate_occupancy(variable: &str, diagnostic: &str, counts: &[f64]) -> OccupancySummary {
        let used: Vec<u64> = counts
            .iter()
            .filter(|c| **c > 0.0)
            .map(|c| *c as u64)
            .collect();
        let total_count: u64 = used.iter().sum();
        let bins_used = used.len();

        let mut count_histogram = BTreeMap::new();
        for &count in &used {
            *count_histogram.entry(count.ilog2()).or_default() += 1;
        }

        OccupancySummary {
            variable: variable.to_string(),
            diagnostic: diagnostic.to_string(),
            total_count,
            bins_used,
            total_bins: counts.len(),
            utilization: if counts.is_empty() {
                0.0
            } else {
                (bins_used as f64 / counts.len() as f64) * 100.0
            },
            min_count: used.iter().min().copied().unwrap_or(0),
            max_count: used.iter().max().copied().unwrap_or(0),
            mean_count: if bins_used > 0 {
                total_count as f64 / bins_used as f64
            } else {
                0.0
            },
            count_histogram,
        }
    }

    /// Generate a readable report.
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!("\nBinned Statistics: {}\n", self.name));
        report.push_str("==================\n\n");
        if let (Some(start), Some(end)) = (&self.window_start, &self.window_end) {
            report.push_str(&format!("Window: {} to {}\n", start, end));
        }
        report.push_str(&format!("Diagnostics: {}\n", self.diagnostics.join(" ")));
        if let Some(channels) = &self.channels {
            let channels: Vec<String> = channels.iter().map(i64::to_string).collect();
            report.push_str(&format!("Channels: {}\n", channels.join(" ")));
        }

        report.push_str("\nDimensions:\n");
        if self.dimensions.is_empty() {
            report.push_str("- none (global)\n");
        }
        for dim in &self.dimensions {
            report.push_str(&format!(
                "- {}: {} bins over [{}, {}]{}\n",
                dim.name,
                dim.bins,
                dim.lower,
                dim.upper,
                dim.units
                    .as_ref()
                    .map(|u| format!(" {}", u))
                    .unwrap_or_default()
            ));
        }
        for (name, center) in &self.sliced_dims {
            report.push_str(&format!("- {}: sliced at {}\n", name, center));
        }
        report.push_str(&format!("Total bins: {}\n", self.total_possible_bins));

        report.push_str("\nOccupancy:\n");
        for occ in &self.occupancy {
            report.push_str(&format!("{} ({}):\n", occ.variable, occ.diagnostic));
            report.push_str(&format!("  - Observations: {}\n", occ.total_count));
            report.push_str(&format!(
                "  - Bins used: {} of {} ({:.2}%)\n",
                occ.bins_used, occ.total_bins, occ.utilization
            ));
            report.push_str(&format!(
                "  - Obs per used bin: min {}, max {}, mean {:.2}\n",
                occ.min_count, occ.max_count, occ.mean_count
            ));
            if !occ.count_histogram.is_empty() {
                report.push_str("  - Bins by obs count:\n");
            }
            for (bucket, bins) in &occ.count_histogram {
                let lower = 1u64 << bucket;
                let upper = lower.checked_mul(2).map_or(u64::MAX, |u| u - 1);
                report.push_str(&format!("    {}-{}: {}\n", lower, upper, bins));
            }
        }

        report
    }
}
