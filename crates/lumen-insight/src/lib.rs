//! Chart selection and insight text for analysis results.

pub mod chart;
pub mod error;
pub mod format;
pub mod summarizer;
pub mod types;

pub use chart::{ChartChoice, ChartRequest, DataCharacteristics, VisualizationSelector};
pub use error::ChartError;
pub use format::{format_currency, format_number};
pub use summarizer::{InsightsSummarizer, SeriesStats};
pub use types::{
    Axes, Axis, AxisFormat, BarDatum, ChartData, HistogramBin, LineSeries, Orientation, PieSlice,
    ScatterPoint, Series, TimePoint, TreemapNode, VisualizationSpec,
};
