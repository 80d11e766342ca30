use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use lumen_core::{ChartType, DataRow};

/// One named slice of a multi-series result (one per compared value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub rows: Vec<DataRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisFormat {
    Currency,
    Number,
    Date,
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub label: String,
    pub format: AxisFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axes {
    pub x: Axis,
    pub y: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarDatum {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<TimePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreemapNode {
    pub label: String,
    pub parent: Option<String>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
}

/// Chart payload: one variant per chart type, each with its own point shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChartData {
    HorizontalBar {
        bars: Vec<BarDatum>,
        sorted: bool,
        show_values: bool,
    },
    #[serde(rename = "bar-vertical")]
    VerticalBar {
        bars: Vec<BarDatum>,
        grouped: bool,
    },
    Line {
        points: Vec<TimePoint>,
        show_points: bool,
        tooltip: bool,
    },
    MultiLine {
        series: Vec<LineSeries>,
        show_points: bool,
        tooltip: bool,
    },
    Histogram {
        bins: Vec<HistogramBin>,
    },
    Pie {
        slices: Vec<PieSlice>,
        show_percentages: bool,
    },
    Treemap {
        nodes: Vec<TreemapNode>,
    },
    Scatter {
        points: Vec<ScatterPoint>,
    },
}

impl ChartData {
    pub fn chart_type(&self) -> ChartType {
        match self {
            Self::HorizontalBar { .. } => ChartType::HorizontalBar,
            Self::VerticalBar { .. } => ChartType::BarVertical,
            Self::Line { .. } => ChartType::Line,
            Self::MultiLine { .. } => ChartType::MultiLine,
            Self::Histogram { .. } => ChartType::Histogram,
            Self::Pie { .. } => ChartType::Pie,
            Self::Treemap { .. } => ChartType::Treemap,
            Self::Scatter { .. } => ChartType::Scatter,
        }
    }

    /// Number of drawable items (bars, points, bins, slices, nodes).
    pub fn len(&self) -> usize {
        match self {
            Self::HorizontalBar { bars, .. } | Self::VerticalBar { bars, .. } => bars.len(),
            Self::Line { points, .. } => points.len(),
            Self::MultiLine { series, .. } => series.iter().map(|s| s.points.len()).sum(),
            Self::Histogram { bins } => bins.len(),
            Self::Pie { slices, .. } => slices.len(),
            Self::Treemap { nodes } => nodes.len(),
            Self::Scatter { points } => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Complete chart specification handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSpec {
    pub chart_type: ChartType,
    pub orientation: Option<Orientation>,
    pub chart: ChartData,
    pub axes: Axes,
    pub title: String,
    pub subtitle: String,
}
