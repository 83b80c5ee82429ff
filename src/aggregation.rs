use crate::error::FootprintError;
use crate::footprint::ACTIVITY_FACTORS;
use crate::schema::{category, emission};
use polars::prelude::*;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3::exceptions::PyValueError;
use pyo3_polars::PyDataFrame;

/// Declarative aggregation specification.
///
/// Users build these from Python; the Rust engine executes them per
/// group of the footprint frame.
#[derive(Debug, Clone)]
#[pyclass(name = "Aggregation")]
pub struct Aggregation {
    pub(crate) kind: AggKind,
}

#[derive(Debug)]
pub enum AggKind {
    Custom {
        callable: PyObject,
    },
    Min {
        column: String,
        alias: Option<String>,
    },
    Max {
        column: String,
        alias: Option<String>,
    },
    Sum {
        columns: Vec<String>,
    },
    Avg {
        columns: Vec<String>,
    },
    ActivityBreakdown {
        include_share: bool,
    },
    CategoryTally,
}

impl Clone for AggKind {
    fn clone(&self) -> Self {
        match self {
            Self::Custom { callable } => {
                let cloned = Python::with_gil(|py| callable.clone_ref(py));
                Self::Custom { callable: cloned }
            }
            Self::Min { column, alias } => Self::Min {
                column: column.clone(),
                alias: alias.clone(),
            },
            Self::Max { column, alias } => Self::Max {
                column: column.clone(),
                alias: alias.clone(),
            },
            Self::Sum { columns } => Self::Sum {
                columns: columns.clone(),
            },
            Self::Avg { columns } => Self::Avg {
                columns: columns.clone(),
            },
            Self::ActivityBreakdown { include_share } => Self::ActivityBreakdown {
                include_share: *include_share,
            },
            Self::CategoryTally => Self::CategoryTally,
        }
    }
}

#[pymethods]
impl Aggregation {
    #[staticmethod]
    fn custom(callable: PyObject) -> Self {
        Self {
            kind: AggKind::Custom { callable },
        }
    }

    #[staticmethod]
    #[pyo3(signature = (column, alias=None))]
    fn min(column: String, alias: Option<String>) -> Self {
        Self {
            kind: AggKind::Min { column, alias },
        }
    }

    #[staticmethod]
    #[pyo3(signature = (column, alias=None))]
    fn max(column: String, alias: Option<String>) -> Self {
        Self {
            kind: AggKind::Max { column, alias },
        }
    }

    #[staticmethod]
    fn sum(columns: Vec<String>) -> Self {
        Self {
            kind: AggKind::Sum { columns },
        }
    }

    #[staticmethod]
    fn avg(columns: Vec<String>) -> Self {
        Self {
            kind: AggKind::Avg { columns },
        }
    }

    /// Per-activity emission totals for the group. Requires the
    /// breakdown columns (compute with `include_breakdown=True`).
    #[staticmethod]
    #[pyo3(signature = (include_share=false))]
    fn activity_breakdown(include_share: bool) -> Self {
        Self {
            kind: AggKind::ActivityBreakdown { include_share },
        }
    }

    /// Row count per category label, emitted as `<label>_days` columns.
    #[staticmethod]
    fn category_tally() -> Self {
        Self {
            kind: AggKind::CategoryTally,
        }
    }
}

/// Apply a list of built-in aggregations to a single group DataFrame.
pub fn apply_builtin_aggregations(
    group: &DataFrame,
    aggregations: &[Aggregation],
) -> Result<Vec<(String, AnyValue<'static>)>, FootprintError> {
    let mut results: Vec<(String, AnyValue<'static>)> = Vec::new();

    for agg in aggregations {
        match &agg.kind {
            AggKind::Custom { callable } => {
                Python::with_gil(|py| -> PyResult<()> {
                    let py_df = PyDataFrame(group.clone());
                    let result = callable.call1(py, (py_df,))?;
                    let dict = result.downcast_bound::<PyDict>(py).map_err(|_| {
                        PyValueError::new_err("Custom aggregation must return a dict")
                    })?;
                    for (key, value) in dict.iter() {
                        let name: String = key.extract()?;
                        if let Ok(f) = value.extract::<f64>() {
                            results.push((name, AnyValue::Float64(f)));
                        } else if let Ok(i) = value.extract::<i64>() {
                            results.push((name, AnyValue::Int64(i)));
                        } else if let Ok(s) = value.extract::<String>() {
                            results.push((name, AnyValue::StringOwned(s.into())));
                        } else {
                            results
                                .push((name, AnyValue::StringOwned(format!("{}", value).into())));
                        }
                    }
                    Ok(())
                })
                .map_err(FootprintError::from)?;
            }
            AggKind::Min { column, alias } => {
                let s = group.column(column)?.as_materialized_series();
                let name = alias.clone().unwrap_or_else(|| format!("{column}_min"));
                let val = s.min_reduce()?;
                let f = val.value().try_extract::<f64>().unwrap_or(f64::NAN);
                results.push((name, AnyValue::Float64(f)));
            }
            AggKind::Max { column, alias } => {
                let s = group.column(column)?.as_materialized_series();
                let name = alias.clone().unwrap_or_else(|| format!("{column}_max"));
                let val = s.max_reduce()?;
                let f = val.value().try_extract::<f64>().unwrap_or(f64::NAN);
                results.push((name, AnyValue::Float64(f)));
            }
            AggKind::Sum { columns } => {
                for col in columns {
                    let s = group.column(col)?.as_materialized_series();
                    let val = s.sum_reduce()?;
                    let f = val.value().try_extract::<f64>().unwrap_or(0.0);
                    results.push((format!("{col}_sum"), AnyValue::Float64(f)));
                }
            }
            AggKind::Avg { columns } => {
                for col in columns {
                    let s = group.column(col)?.as_materialized_series();
                    let mean = s.mean_reduce();
                    let f = mean.value().try_extract::<f64>().unwrap_or(f64::NAN);
                    results.push((format!("{col}_avg"), AnyValue::Float64(f)));
                }
            }
            AggKind::ActivityBreakdown { include_share } => {
                let mut sums = [0.0f64; 6];
                for (i, factor) in ACTIVITY_FACTORS.iter().enumerate() {
                    let s = group
                        .column(factor.emission_column)
                        .map_err(|_| {
                            FootprintError::MissingColumn(format!(
                                "{} (compute footprints with include_breakdown=True)",
                                factor.emission_column
                            ))
                        })?
                        .as_materialized_series();
                    let val = s.sum_reduce()?;
                    sums[i] = val.value().try_extract::<f64>().unwrap_or(0.0);
                }

                for (i, factor) in ACTIVITY_FACTORS.iter().enumerate() {
                    results.push((
                        factor.emission_column.to_string(),
                        AnyValue::Float64(sums[i]),
                    ));
                }

                if *include_share {
                    let total: f64 = sums.iter().sum();
                    for (i, factor) in ACTIVITY_FACTORS.iter().enumerate() {
                        let share = if total != 0.0 { sums[i] / total } else { 0.0 };
                        results.push((
                            format!("{}_share", factor.emission_column),
                            AnyValue::Float64(share),
                        ));
                    }
                }
            }
            AggKind::CategoryTally => {
                let cats = group.column(emission::CATEGORY)?.str()?;
                for label in category::ALL {
                    let count = cats.into_iter().filter(|v| *v == Some(label)).count() as i64;
                    results.push((
                        format!("{}_days", label.to_lowercase()),
                        AnyValue::Int64(count),
                    ));
                }
            }
        }
    }

    Ok(results)
}

/// Partition `df` by `group_cols` and apply the aggregations per group.
///
/// Output: one row per group, group key columns first, then one column
/// per aggregation result.
pub fn aggregate_by_groups(
    df: &DataFrame,
    aggregations: &[Aggregation],
    group_cols: &[String],
) -> Result<DataFrame, FootprintError> {
    let partitions = df.partition_by(group_cols, true)?;

    if partitions.is_empty() {
        return Ok(df.clone());
    }

    // Determine output column names from the first group
    let sample_results = apply_builtin_aggregations(&partitions[0], aggregations)?;
    let agg_names: Vec<String> = sample_results
        .iter()
        .map(|(name, _)| name.clone())
        .collect();

    // Group keys: take first row of each partition
    let mut key_columns: Vec<Vec<AnyValue>> = vec![vec![]; group_cols.len()];
    let mut agg_columns: Vec<Vec<AnyValue>> = vec![vec![]; agg_names.len()];

    for partition in &partitions {
        for (i, gc) in group_cols.iter().enumerate() {
            let val = partition.column(gc)?.get(0)?;
            key_columns[i].push(val.into_static());
        }

        let results = apply_builtin_aggregations(partition, aggregations)?;
        for (i, (_name, val)) in results.into_iter().enumerate() {
            agg_columns[i].push(val);
        }
    }

    let mut columns: Vec<Column> = Vec::new();

    for (i, gc) in group_cols.iter().enumerate() {
        let series = Series::from_any_values(gc.into(), &key_columns[i], true)?;
        columns.push(series.into());
    }

    for (i, name) in agg_names.iter().enumerate() {
        let series = Series::from_any_values(name.into(), &agg_columns[i], true)?;
        columns.push(series.into());
    }

    Ok(DataFrame::new(columns)?)
}
