use std::collections::HashMap;
use std::path::PathBuf;

use polars::datatypes::TimeUnit;
use polars::prelude::StrptimeOptions;
use polars::prelude::*;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDateTime;
use pyo3_polars::PyDataFrame;

use chrono::NaiveDateTime;

use crate::aggregation::{aggregate_by_groups, Aggregation};
use crate::error::FootprintError;
use crate::footprint::{
    Category, ACTIVITY_FACTORS, AVERAGE_BELOW_KG, EXCELLENT_BELOW_KG, GOOD_BELOW_KG,
};
use crate::report::{self, ReportConfig};
use crate::schema::*;

#[pyclass]
pub struct FootprintModel {
    base_path: PathBuf,
    activities: Option<DataFrame>,
    footprints: Option<DataFrame>,
}

#[pymethods]
impl FootprintModel {
    #[new]
    fn new(base_path: String) -> Self {
        Self {
            base_path: PathBuf::from(base_path),
            activities: None,
            footprints: None,
        }
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load any CSV into a Polars DataFrame with all columns as strings.
    /// Optionally rename columns via a map.
    #[pyo3(signature = (filename, rename=None))]
    fn load_csv(
        &self,
        filename: &str,
        rename: Option<HashMap<String, String>>,
    ) -> PyResult<PyDataFrame> {
        let df = self.read_csv_as_strings(filename, rename)?;
        Ok(PyDataFrame(df))
    }

    /// Load the activity log CSV (one row per day).
    ///
    /// At least one of the six activity columns must be present:
    ///     car_travel_km, electricity_kwh, flight_hours,
    ///     meat_grams, dairy_grams, plant_grams
    ///
    /// Present activity columns are cast to Float64; absent or
    /// unparsable cells become 0. Missing activity columns are created
    /// as 0 so every row carries the full six-input record.
    /// A date_time column, if present, is parsed as
    /// "%Y-%m-%d %H:%M:%S". All other columns are preserved as strings.
    #[pyo3(signature = (filename=None))]
    fn load_activities(&mut self, filename: Option<&str>) -> PyResult<PyDataFrame> {
        let fname = filename.unwrap_or("activities.csv");
        let raw = self.read_csv_as_strings(fname, None)?;

        let coerced = Self::coerce_activity_columns(raw)?;
        let df = Self::parse_datetime_column(coerced, timeseries::DATE_TIME, "%Y-%m-%d %H:%M:%S")?;

        self.activities = Some(df.clone());
        self.footprints = None;
        Ok(PyDataFrame(df))
    }

    // ── Footprint computation ───────────────────────────────────────────────

    /// Compute per-row footprints over the loaded activity log.
    ///
    /// Appends total_kg_co2 (the weighted sum of the six activity
    /// columns) and category (ordered threshold classification). With
    /// include_breakdown, also one <activity>_kg_co2 column per
    /// activity.
    #[pyo3(signature = (include_breakdown=false))]
    fn compute_footprints(&mut self, include_breakdown: bool) -> PyResult<PyDataFrame> {
        let activities = self
            .activities
            .as_ref()
            .ok_or_else(|| FootprintError::NotLoaded("activities".into()))?;

        let df = Self::compute_frame(activities.clone(), include_breakdown)?;
        self.footprints = Some(df.clone());
        Ok(PyDataFrame(df))
    }

    // ── Filtering ───────────────────────────────────────────────────────────

    fn get_entries_since(&self, timestamp: Bound<PyDateTime>) -> PyResult<PyDataFrame> {
        // Reject timezone-aware datetimes
        if !timestamp.getattr("tzinfo")?.is_none() {
            return Err(PyValueError::new_err(
                "carbon-tracekit requires naive datetime objects (no timezone info). \
                 Use datetime(2024, 6, 15, 12, 0, 0) instead of datetime(..., tzinfo=...)",
            ));
        }

        let dt: NaiveDateTime = timestamp.extract()?;
        let timestamp_us = dt.and_utc().timestamp_micros();

        let footprints = self
            .footprints
            .as_ref()
            .ok_or_else(|| FootprintError::NotLoaded("footprints".into()))?;

        let df = Self::entries_since_frame(footprints, timestamp_us)?;
        Ok(PyDataFrame(df))
    }

    fn get_entries_in_category(&self, categories: Vec<String>) -> PyResult<PyDataFrame> {
        for label in &categories {
            if Category::from_label(label).is_none() {
                return Err(PyValueError::new_err(format!(
                    "Invalid category: '{}'. Must be one of {:?}",
                    label,
                    category::ALL
                )));
            }
        }

        let footprints = self
            .footprints
            .as_ref()
            .ok_or_else(|| FootprintError::NotLoaded("footprints".into()))?;

        let df = Self::entries_in_category_frame(footprints, &categories)?;
        Ok(PyDataFrame(df))
    }

    // ── Aggregation (built-in) ──────────────────────────────────────────────

    /// Aggregate the computed footprint frame using built-in Rust
    /// aggregations.
    ///
    /// `aggregations`: list of `Aggregation` objects.
    /// `group_by`: column names to group by (default: category).
    #[pyo3(signature = (aggregations, group_by=None))]
    fn aggregate_footprints(
        &self,
        aggregations: Vec<Aggregation>,
        group_by: Option<Vec<String>>,
    ) -> PyResult<PyDataFrame> {
        let footprints = self
            .footprints
            .as_ref()
            .ok_or_else(|| FootprintError::NotLoaded("footprints".into()))?;

        let group_cols = group_by.unwrap_or_else(|| vec![emission::CATEGORY.to_string()]);

        let df = aggregate_by_groups(footprints, &aggregations, &group_cols)?;
        Ok(PyDataFrame(df))
    }

    // ── Parse helpers ───────────────────────────────────────────────────────

    /// Parse a string column to Datetime using the given format string.
    ///
    /// Example formats: "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y"
    #[staticmethod]
    fn parse_datetime(df: PyDataFrame, column: &str, format: &str) -> PyResult<PyDataFrame> {
        let result = Self::parse_datetime_column(df.0, column, format)?;
        Ok(PyDataFrame(result))
    }

    /// Parse a string column to Float64. Unparsable cells become null.
    #[staticmethod]
    fn parse_float(df: PyDataFrame, column: &str) -> PyResult<PyDataFrame> {
        let result = Self::parse_float_column(df.0, column)?;
        Ok(PyDataFrame(result))
    }

    /// Parse a string column to Int64. Unparsable cells become null.
    #[staticmethod]
    fn parse_int(df: PyDataFrame, column: &str) -> PyResult<PyDataFrame> {
        let result = Self::parse_int_column(df.0, column)?;
        Ok(PyDataFrame(result))
    }

    // ── Visualization ───────────────────────────────────────────────────────

    /// Visualize the computed footprint frame as a bar chart.
    ///
    /// Returns a self-contained HTML string with inline SVG.
    /// Use with `IPython.display.HTML(model.visualize_footprints())` in
    /// Jupyter.
    #[pyo3(signature = (title=None, tip=None, row_height_px=22, max_bar_px=420))]
    fn visualize_footprints(
        &self,
        title: Option<String>,
        tip: Option<String>,
        row_height_px: u32,
        max_bar_px: u32,
    ) -> PyResult<String> {
        let footprints = self
            .footprints
            .as_ref()
            .ok_or_else(|| FootprintError::NotLoaded("footprints".into()))?;

        let config = ReportConfig {
            title,
            tip: tip.or_else(|| ReportConfig::default().tip),
            row_height_px,
            max_bar_px,
        };

        report::render_log_chart(footprints, &config).map_err(|e| e.into())
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn activities_df(&self) -> PyResult<Option<PyDataFrame>> {
        Ok(self.activities.clone().map(PyDataFrame))
    }

    #[getter]
    fn footprints_df(&self) -> PyResult<Option<PyDataFrame>> {
        Ok(self.footprints.clone().map(PyDataFrame))
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl FootprintModel {
    /// Read a CSV file with all columns as String dtype.
    /// Trims whitespace from column names and applies optional rename.
    fn read_csv_as_strings(
        &self,
        filename: &str,
        rename: Option<HashMap<String, String>>,
    ) -> Result<DataFrame, FootprintError> {
        let path = self.base_path.join(filename);
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0)) // all columns as String
            .try_into_reader_with_file_path(Some(path))?
            .finish()?;

        // Trim whitespace from column names
        let trimmed: Vec<String> = df
            .get_column_names_str()
            .iter()
            .map(|c| c.trim().to_string())
            .collect();
        df.set_column_names(trimmed.as_slice())?;

        // Apply optional column rename
        if let Some(map) = rename {
            let old: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
            let new: Vec<&str> = map.values().map(|s| s.as_str()).collect();
            df = df.lazy().rename(old, new, true).collect()?;
        }

        Ok(df)
    }

    /// Coerce the six activity columns to Float64.
    ///
    /// Present columns: whitespace-stripped, cast non-strictly (absent
    /// or unparsable cells → null), nulls filled with 0. Absent columns
    /// are created as 0. Negative values pass through unclamped.
    fn coerce_activity_columns(raw: DataFrame) -> Result<DataFrame, FootprintError> {
        let schema = raw.schema();
        if !activity::ALL.iter().any(|c| schema.contains(c)) {
            return Err(FootprintError::InvalidData(format!(
                "Activities CSV must contain at least one activity column: {}",
                activity::ALL.join(", ")
            )));
        }

        let mut exprs: Vec<Expr> = Vec::with_capacity(activity::ALL.len());
        for name in activity::ALL {
            if schema.contains(name) {
                exprs.push(
                    col(name)
                        .str()
                        .strip_chars(lit(" \t\r\n"))
                        .cast(DataType::Float64)
                        .fill_null(lit(0.0))
                        .alias(name),
                );
            } else {
                exprs.push(lit(0.0).alias(name));
            }
        }

        Ok(raw.lazy().with_columns(exprs).collect()?)
    }

    /// The frame form of the core calculation: weighted sum over the
    /// six activity columns, then ordered threshold classification.
    fn compute_frame(
        df: DataFrame,
        include_breakdown: bool,
    ) -> Result<DataFrame, FootprintError> {
        Self::require_columns(&df, &activity::ALL)?;

        let mut total = lit(0.0);
        for factor in &ACTIVITY_FACTORS {
            total = total + col(factor.activity_column) * lit(factor.kg_co2_per_unit);
        }

        let mut lazy = df.lazy();

        if include_breakdown {
            let breakdown: Vec<Expr> = ACTIVITY_FACTORS
                .iter()
                .map(|f| (col(f.activity_column) * lit(f.kg_co2_per_unit)).alias(f.emission_column))
                .collect();
            lazy = lazy.with_columns(breakdown);
        }

        lazy = lazy.with_columns([total.alias(emission::TOTAL_KG_CO2)]);

        // First match wins
        lazy = lazy.with_columns([
            when(col(emission::TOTAL_KG_CO2).lt(lit(EXCELLENT_BELOW_KG)))
                .then(lit(category::EXCELLENT))
                .when(col(emission::TOTAL_KG_CO2).lt(lit(GOOD_BELOW_KG)))
                .then(lit(category::GOOD))
                .when(col(emission::TOTAL_KG_CO2).lt(lit(AVERAGE_BELOW_KG)))
                .then(lit(category::AVERAGE))
                .otherwise(lit(category::HIGH))
                .alias(emission::CATEGORY),
        ]);

        Ok(lazy.collect()?)
    }

    fn entries_since_frame(df: &DataFrame, timestamp_us: i64) -> Result<DataFrame, FootprintError> {
        if df.column(timeseries::DATE_TIME).is_err() {
            return Err(FootprintError::MissingColumn(timeseries::DATE_TIME.to_string()));
        }

        Ok(df
            .clone()
            .lazy()
            .filter(col(timeseries::DATE_TIME).gt_eq(lit(timestamp_us)))
            .collect()?)
    }

    fn entries_in_category_frame(
        df: &DataFrame,
        categories: &[String],
    ) -> Result<DataFrame, FootprintError> {
        let wanted = Series::new("categories".into(), categories.to_vec());

        Ok(df
            .clone()
            .lazy()
            .filter(col(emission::CATEGORY).is_in(lit(wanted), false))
            .collect()?)
    }

    fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), FootprintError> {
        for &col_name in required {
            if df.column(col_name).is_err() {
                return Err(FootprintError::MissingColumn(col_name.to_string()));
            }
        }
        Ok(())
    }

    /// Parse a string column to Datetime. Handles null values gracefully.
    fn parse_datetime_column(
        df: DataFrame,
        column: &str,
        format: &str,
    ) -> Result<DataFrame, FootprintError> {
        if df.column(column).is_ok() {
            let df = df
                .lazy()
                .with_columns([col(column)
                    .str()
                    .strip_chars(lit(" \t\r\n"))
                    .str()
                    .to_datetime(
                        Some(TimeUnit::Microseconds),
                        None,
                        StrptimeOptions {
                            format: Some(format.into()),
                            strict: true,
                            ..Default::default()
                        },
                        lit("raise"),
                    )])
                .collect()?;
            Ok(df)
        } else {
            Ok(df)
        }
    }

    fn parse_float_column(df: DataFrame, column: &str) -> Result<DataFrame, FootprintError> {
        Ok(df
            .lazy()
            .with_columns([col(column)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .cast(DataType::Float64)])
            .collect()?)
    }

    fn parse_int_column(df: DataFrame, column: &str) -> Result<DataFrame, FootprintError> {
        Ok(df
            .lazy()
            .with_columns([col(column)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .cast(DataType::Int64)])
            .collect()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::{compute, ActivityInput};
    use chrono::NaiveDate;

    fn f64_at(df: &DataFrame, column: &str, row: usize) -> f64 {
        df.column(column)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(row)
            .unwrap()
    }

    fn str_at<'a>(df: &'a DataFrame, column: &str, row: usize) -> &'a str {
        df.column(column).unwrap().str().unwrap().get(row).unwrap()
    }

    #[test]
    fn coerce_fills_missing_and_unparsable_with_zero() {
        let raw = df!(
            activity::CAR_TRAVEL_KM => ["25", "abc", ""],
            activity::MEAT_GRAMS => ["200", " 40 ", "x"],
        )
        .unwrap();

        let coerced = FootprintModel::coerce_activity_columns(raw).unwrap();

        assert_eq!(f64_at(&coerced, activity::CAR_TRAVEL_KM, 0), 25.0);
        assert_eq!(f64_at(&coerced, activity::CAR_TRAVEL_KM, 1), 0.0);
        assert_eq!(f64_at(&coerced, activity::CAR_TRAVEL_KM, 2), 0.0);
        assert_eq!(f64_at(&coerced, activity::MEAT_GRAMS, 1), 40.0);

        // Absent activity columns are created as zero
        for name in activity::ALL {
            for row in 0..3 {
                let _ = f64_at(&coerced, name, row);
            }
        }
        assert_eq!(f64_at(&coerced, activity::FLIGHT_HOURS, 0), 0.0);
    }

    #[test]
    fn coerce_requires_at_least_one_activity_column() {
        let raw = df!("notes" => ["walked to work"]).unwrap();
        let err = FootprintModel::coerce_activity_columns(raw).unwrap_err();
        assert!(matches!(err, FootprintError::InvalidData(_)));
    }

    #[test]
    fn coerce_preserves_negative_values() {
        let raw = df!(activity::CAR_TRAVEL_KM => ["-10"]).unwrap();
        let coerced = FootprintModel::coerce_activity_columns(raw).unwrap();
        assert_eq!(f64_at(&coerced, activity::CAR_TRAVEL_KM, 0), -10.0);
    }

    #[test]
    fn compute_frame_matches_scalar_core() {
        let raw = df!(
            activity::CAR_TRAVEL_KM => ["25", "0", "0"],
            activity::ELECTRICITY_KWH => ["15", "0", "10"],
            activity::FLIGHT_HOURS => ["2", "0", "0"],
            activity::MEAT_GRAMS => ["200", "0", "0"],
            activity::DAIRY_GRAMS => ["300", "0", "0"],
            activity::PLANT_GRAMS => ["500", "0", "0"],
        )
        .unwrap();
        let coerced = FootprintModel::coerce_activity_columns(raw).unwrap();
        let footprints = FootprintModel::compute_frame(coerced.clone(), false).unwrap();

        for row in 0..footprints.height() {
            let input = ActivityInput {
                car_travel_km: f64_at(&coerced, activity::CAR_TRAVEL_KM, row),
                electricity_kwh: f64_at(&coerced, activity::ELECTRICITY_KWH, row),
                flight_hours: f64_at(&coerced, activity::FLIGHT_HOURS, row),
                meat_grams: f64_at(&coerced, activity::MEAT_GRAMS, row),
                dairy_grams: f64_at(&coerced, activity::DAIRY_GRAMS, row),
                plant_grams: f64_at(&coerced, activity::PLANT_GRAMS, row),
            };
            let expected = compute(&input);
            let total = f64_at(&footprints, emission::TOTAL_KG_CO2, row);
            assert!((total - expected.total_kg_co2).abs() < 1e-9);
            assert_eq!(
                str_at(&footprints, emission::CATEGORY, row),
                expected.category.label()
            );
        }

        assert!((f64_at(&footprints, emission::TOTAL_KG_CO2, 0) - 200.14).abs() < 1e-9);
        assert_eq!(str_at(&footprints, emission::CATEGORY, 0), category::HIGH);
        assert_eq!(str_at(&footprints, emission::CATEGORY, 1), category::EXCELLENT);
        assert_eq!(f64_at(&footprints, emission::TOTAL_KG_CO2, 2), 5.0);
    }

    #[test]
    fn compute_frame_category_boundaries() {
        // electricity × 0.5 lands the totals exactly on the band edges
        let raw = df!(
            activity::ELECTRICITY_KWH => ["19.999998", "20", "40", "60"],
        )
        .unwrap();
        let coerced = FootprintModel::coerce_activity_columns(raw).unwrap();
        let footprints = FootprintModel::compute_frame(coerced, false).unwrap();

        assert_eq!(str_at(&footprints, emission::CATEGORY, 0), category::EXCELLENT);
        assert_eq!(str_at(&footprints, emission::CATEGORY, 1), category::GOOD);
        assert_eq!(str_at(&footprints, emission::CATEGORY, 2), category::AVERAGE);
        assert_eq!(str_at(&footprints, emission::CATEGORY, 3), category::HIGH);
    }

    #[test]
    fn breakdown_columns_sum_to_total() {
        let raw = df!(
            activity::CAR_TRAVEL_KM => ["25", "3"],
            activity::ELECTRICITY_KWH => ["15", "1"],
            activity::FLIGHT_HOURS => ["2", "0"],
            activity::MEAT_GRAMS => ["200", "50"],
            activity::DAIRY_GRAMS => ["300", "0"],
            activity::PLANT_GRAMS => ["500", "100"],
        )
        .unwrap();
        let coerced = FootprintModel::coerce_activity_columns(raw).unwrap();
        let footprints = FootprintModel::compute_frame(coerced, true).unwrap();

        for row in 0..footprints.height() {
            let sum: f64 = emission::BREAKDOWN
                .iter()
                .map(|c| f64_at(&footprints, c, row))
                .sum();
            let total = f64_at(&footprints, emission::TOTAL_KG_CO2, row);
            assert!((sum - total).abs() < 1e-9);
        }
    }

    #[test]
    fn compute_frame_requires_activity_columns() {
        let df = df!("foo" => [1.0]).unwrap();
        let err = FootprintModel::compute_frame(df, false).unwrap_err();
        assert!(matches!(err, FootprintError::MissingColumn(_)));
    }

    #[test]
    fn entries_in_category_filters_rows() {
        let raw = df!(
            activity::FLIGHT_HOURS => ["2", "0", "0"],
            activity::ELECTRICITY_KWH => ["0", "10", "25"],
        )
        .unwrap();
        let coerced = FootprintModel::coerce_activity_columns(raw).unwrap();
        let footprints = FootprintModel::compute_frame(coerced, false).unwrap();

        let high = FootprintModel::entries_in_category_frame(
            &footprints,
            &[category::HIGH.to_string()],
        )
        .unwrap();
        assert_eq!(high.height(), 1);

        let low = FootprintModel::entries_in_category_frame(
            &footprints,
            &[category::EXCELLENT.to_string(), category::GOOD.to_string()],
        )
        .unwrap();
        assert_eq!(low.height(), 2);
    }

    #[test]
    fn entries_since_filters_by_timestamp() {
        let raw = df!(
            timeseries::DATE_TIME => ["2024-06-14 08:00:00", "2024-06-16 08:00:00"],
            "notes" => ["before", "after"],
        )
        .unwrap();
        let parsed = FootprintModel::parse_datetime_column(
            raw,
            timeseries::DATE_TIME,
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap();

        let cutoff = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_micros();

        let filtered = FootprintModel::entries_since_frame(&parsed, cutoff).unwrap();
        assert_eq!(filtered.height(), 1);
        assert_eq!(str_at(&filtered, "notes", 0), "after");
    }

    #[test]
    fn entries_since_requires_date_column() {
        let df = df!("x" => [1.0]).unwrap();
        let err = FootprintModel::entries_since_frame(&df, 0).unwrap_err();
        assert!(matches!(err, FootprintError::MissingColumn(_)));
    }

    #[test]
    fn parse_float_column_strips_whitespace() {
        let df = df!("value" => [" 1.5 ", "oops"]).unwrap();
        let parsed = FootprintModel::parse_float_column(df, "value").unwrap();
        let values = parsed
            .column("value")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert_eq!(values.get(0), Some(1.5));
        assert_eq!(values.get(1), None);
    }
}
