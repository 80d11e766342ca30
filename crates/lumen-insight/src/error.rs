use thiserror::Error;

use lumen_core::ChartType;

/// Errors from chart construction. Empty data is never rendered silently.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("no data to render as {}", .0.as_str())]
    EmptyData(ChartType),
    #[error("missing column: {0}")]
    MissingColumn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_empty_data() {
        let e = ChartError::EmptyData(ChartType::Line);
        assert_eq!(e.to_string(), "no data to render as line");
    }

    #[test]
    fn test_error_display_missing_column() {
        let e = ChartError::MissingColumn("total_sales".to_string());
        assert_eq!(e.to_string(), "missing column: total_sales");
    }
}
