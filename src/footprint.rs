/// Footprint core: fixed emission factors, the weighted-sum calculation,
/// and the four-band severity classification.
///
/// Everything here is pure and total: no I/O, no shared state, defined
/// for every real-valued input (negative values pass through unclamped
/// and simply reduce the total).
use pyo3::prelude::*;

use crate::report::{self, ReportConfig};
use crate::schema::{activity, category, emission};

// ── Emission factors (kg CO2-equivalent per unit) ───────────────────────────

pub const CAR_KG_PER_KM: f64 = 0.21;
pub const ELECTRICITY_KG_PER_KWH: f64 = 0.5;
pub const FLIGHT_KG_PER_HOUR: f64 = 90.0;
pub const MEAT_KG_PER_GRAM: f64 = 0.027;
pub const DAIRY_KG_PER_GRAM: f64 = 0.0033;
pub const PLANT_KG_PER_GRAM: f64 = 0.002;

/// One activity with its input column, computed-emission column,
/// display label, and emission factor.
pub struct ActivityFactor {
    pub activity_column: &'static str,
    pub emission_column: &'static str,
    pub label: &'static str,
    pub kg_co2_per_unit: f64,
}

/// The six activities, in schema order. Drives both the scalar core and
/// the frame pipeline so the two can never disagree on a factor.
pub const ACTIVITY_FACTORS: [ActivityFactor; 6] = [
    ActivityFactor {
        activity_column: activity::CAR_TRAVEL_KM,
        emission_column: emission::CAR_TRAVEL_KG_CO2,
        label: "Car travel",
        kg_co2_per_unit: CAR_KG_PER_KM,
    },
    ActivityFactor {
        activity_column: activity::ELECTRICITY_KWH,
        emission_column: emission::ELECTRICITY_KG_CO2,
        label: "Electricity",
        kg_co2_per_unit: ELECTRICITY_KG_PER_KWH,
    },
    ActivityFactor {
        activity_column: activity::FLIGHT_HOURS,
        emission_column: emission::FLIGHTS_KG_CO2,
        label: "Flights",
        kg_co2_per_unit: FLIGHT_KG_PER_HOUR,
    },
    ActivityFactor {
        activity_column: activity::MEAT_GRAMS,
        emission_column: emission::MEAT_KG_CO2,
        label: "Meat intake",
        kg_co2_per_unit: MEAT_KG_PER_GRAM,
    },
    ActivityFactor {
        activity_column: activity::DAIRY_GRAMS,
        emission_column: emission::DAIRY_KG_CO2,
        label: "Dairy intake",
        kg_co2_per_unit: DAIRY_KG_PER_GRAM,
    },
    ActivityFactor {
        activity_column: activity::PLANT_GRAMS,
        emission_column: emission::PLANT_KG_CO2,
        label: "Plant intake",
        kg_co2_per_unit: PLANT_KG_PER_GRAM,
    },
];

// ── Category thresholds (kg CO2 per day, ordered, first match wins) ─────────

pub const EXCELLENT_BELOW_KG: f64 = 10.0;
pub const GOOD_BELOW_KG: f64 = 20.0;
pub const AVERAGE_BELOW_KG: f64 = 30.0;

/// Severity band for a daily footprint total.
#[pyclass(eq, eq_int)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Excellent,
    Good,
    Average,
    High,
}

#[pymethods]
impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Excellent => category::EXCELLENT,
            Category::Good => category::GOOD,
            Category::Average => category::AVERAGE,
            Category::High => category::HIGH,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Excellent => "Very low carbon footprint!",
            Category::Good => "Below average carbon footprint",
            Category::Average => "Average carbon footprint",
            Category::High => "Consider reducing your carbon footprint",
        }
    }

    pub fn color_tag(&self) -> &'static str {
        match self {
            Category::Excellent => "green",
            Category::Good => "yellow",
            Category::Average => "orange",
            Category::High => "red",
        }
    }

    #[staticmethod]
    pub fn from_label(label: &str) -> Option<Category> {
        match label {
            category::EXCELLENT => Some(Category::Excellent),
            category::GOOD => Some(Category::Good),
            category::AVERAGE => Some(Category::Average),
            category::HIGH => Some(Category::High),
            _ => None,
        }
    }

    fn __repr__(&self) -> String {
        format!("Category.{}", self.label())
    }
}

// ── Input / result value objects ────────────────────────────────────────────

/// One day of activity inputs. Constructed by the caller, passed once
/// into the calculation; fields left at their default contribute zero.
#[pyclass]
#[derive(Debug, Clone, Default)]
pub struct ActivityInput {
    #[pyo3(get, set)]
    pub car_travel_km: f64,
    #[pyo3(get, set)]
    pub electricity_kwh: f64,
    #[pyo3(get, set)]
    pub flight_hours: f64,
    #[pyo3(get, set)]
    pub meat_grams: f64,
    #[pyo3(get, set)]
    pub dairy_grams: f64,
    #[pyo3(get, set)]
    pub plant_grams: f64,
}

impl ActivityInput {
    /// Field values in schema order (matching `ACTIVITY_FACTORS`).
    pub fn amounts(&self) -> [f64; 6] {
        [
            self.car_travel_km,
            self.electricity_kwh,
            self.flight_hours,
            self.meat_grams,
            self.dairy_grams,
            self.plant_grams,
        ]
    }

    /// Weighted contributions (label, kg CO2) in schema order.
    pub fn terms(&self) -> [(&'static str, f64); 6] {
        let amounts = self.amounts();
        let mut out = [("", 0.0); 6];
        for (i, factor) in ACTIVITY_FACTORS.iter().enumerate() {
            out[i] = (factor.label, amounts[i] * factor.kg_co2_per_unit);
        }
        out
    }
}

#[pymethods]
impl ActivityInput {
    #[new]
    #[pyo3(signature = (
        car_travel_km = 0.0,
        electricity_kwh = 0.0,
        flight_hours = 0.0,
        meat_grams = 0.0,
        dairy_grams = 0.0,
        plant_grams = 0.0
    ))]
    fn new(
        car_travel_km: f64,
        electricity_kwh: f64,
        flight_hours: f64,
        meat_grams: f64,
        dairy_grams: f64,
        plant_grams: f64,
    ) -> Self {
        Self {
            car_travel_km,
            electricity_kwh,
            flight_hours,
            meat_grams,
            dairy_grams,
            plant_grams,
        }
    }

    /// Compute this day's footprint.
    #[pyo3(name = "compute")]
    fn compute_py(&self) -> FootprintResult {
        compute(self)
    }

    /// Self-contained HTML result card for this day.
    ///
    /// Use with `IPython.display.HTML(...)` in Jupyter.
    fn visualize(&self) -> String {
        let result = compute(self);
        report::render_result_card(self, &result, &ReportConfig::default())
    }

    fn __repr__(&self) -> String {
        format!(
            "ActivityInput(car_travel_km={}, electricity_kwh={}, flight_hours={}, \
             meat_grams={}, dairy_grams={}, plant_grams={})",
            self.car_travel_km,
            self.electricity_kwh,
            self.flight_hours,
            self.meat_grams,
            self.dairy_grams,
            self.plant_grams,
        )
    }
}

/// Result of one footprint calculation. No identity beyond its values.
#[pyclass]
#[derive(Debug, Clone)]
pub struct FootprintResult {
    /// Unrounded weighted sum; rounding is a display-only concern.
    #[pyo3(get)]
    pub total_kg_co2: f64,
    #[pyo3(get)]
    pub category: Category,
}

#[pymethods]
impl FootprintResult {
    pub fn description(&self) -> &'static str {
        self.category.description()
    }

    pub fn color_tag(&self) -> &'static str {
        self.category.color_tag()
    }

    /// Notification line for the presentation layer. The only place the
    /// total is rounded.
    pub fn summary(&self) -> String {
        format!(
            "Your daily carbon footprint is {:.2} kg CO2",
            self.total_kg_co2
        )
    }

    fn __repr__(&self) -> String {
        format!(
            "FootprintResult(total_kg_co2={}, category={})",
            self.total_kg_co2,
            self.category.label()
        )
    }
}

// ── The core calculation ────────────────────────────────────────────────────

/// total = Σ(amount_i × factor_i) over the six activities.
/// No rounding during summation.
pub fn compute(input: &ActivityInput) -> FootprintResult {
    let amounts = input.amounts();
    let total_kg_co2: f64 = ACTIVITY_FACTORS
        .iter()
        .zip(amounts)
        .map(|(factor, amount)| amount * factor.kg_co2_per_unit)
        .sum();

    FootprintResult {
        total_kg_co2,
        category: categorize(total_kg_co2),
    }
}

/// Ordered threshold classification, first match wins.
pub fn categorize(total_kg_co2: f64) -> Category {
    if total_kg_co2 < EXCELLENT_BELOW_KG {
        Category::Excellent
    } else if total_kg_co2 < GOOD_BELOW_KG {
        Category::Good
    } else if total_kg_co2 < AVERAGE_BELOW_KG {
        Category::Average
    } else {
        Category::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn add(a: &ActivityInput, b: &ActivityInput) -> ActivityInput {
        ActivityInput {
            car_travel_km: a.car_travel_km + b.car_travel_km,
            electricity_kwh: a.electricity_kwh + b.electricity_kwh,
            flight_hours: a.flight_hours + b.flight_hours,
            meat_grams: a.meat_grams + b.meat_grams,
            dairy_grams: a.dairy_grams + b.dairy_grams,
            plant_grams: a.plant_grams + b.plant_grams,
        }
    }

    fn scale(input: &ActivityInput, k: f64) -> ActivityInput {
        ActivityInput {
            car_travel_km: input.car_travel_km * k,
            electricity_kwh: input.electricity_kwh * k,
            flight_hours: input.flight_hours * k,
            meat_grams: input.meat_grams * k,
            dairy_grams: input.dairy_grams * k,
            plant_grams: input.plant_grams * k,
        }
    }

    #[test]
    fn all_zero_input_is_excellent() {
        let result = compute(&ActivityInput::default());
        assert_eq!(result.total_kg_co2, 0.0);
        assert_eq!(result.category, Category::Excellent);
    }

    #[test]
    fn concrete_scenario_is_high() {
        let input = ActivityInput {
            car_travel_km: 25.0,
            electricity_kwh: 15.0,
            flight_hours: 2.0,
            meat_grams: 200.0,
            dairy_grams: 300.0,
            plant_grams: 500.0,
        };
        let result = compute(&input);
        // 5.25 + 7.5 + 180 + 5.4 + 0.99 + 1.0
        assert!((result.total_kg_co2 - 200.14).abs() < 1e-9);
        assert_eq!(result.category, Category::High);
    }

    #[test]
    fn electricity_only_is_excellent() {
        let input = ActivityInput {
            electricity_kwh: 10.0,
            ..Default::default()
        };
        let result = compute(&input);
        assert_eq!(result.total_kg_co2, 5.0);
        assert_eq!(result.category, Category::Excellent);
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(categorize(9.999999), Category::Excellent);
        assert_eq!(categorize(10.0), Category::Good);
        assert_eq!(categorize(19.999999), Category::Good);
        assert_eq!(categorize(20.0), Category::Average);
        assert_eq!(categorize(29.999999), Category::Average);
        assert_eq!(categorize(30.0), Category::High);
    }

    #[test]
    fn negative_inputs_pass_through() {
        let input = ActivityInput {
            car_travel_km: -10.0,
            ..Default::default()
        };
        let result = compute(&input);
        assert!((result.total_kg_co2 - (-2.1)).abs() < 1e-12);
        assert_eq!(result.category, Category::Excellent);
    }

    #[test]
    fn summary_rounds_to_two_decimals() {
        let result = FootprintResult {
            total_kg_co2: 200.14000000000001,
            category: Category::High,
        };
        assert_eq!(
            result.summary(),
            "Your daily carbon footprint is 200.14 kg CO2"
        );
    }

    #[test]
    fn category_labels_round_trip() {
        for cat in [
            Category::Excellent,
            Category::Good,
            Category::Average,
            Category::High,
        ] {
            assert_eq!(Category::from_label(cat.label()), Some(cat));
        }
        assert_eq!(Category::from_label("excellent"), None);
    }

    fn arb_input() -> impl Strategy<Value = ActivityInput> {
        (
            0.0f64..2000.0,
            0.0f64..500.0,
            0.0f64..24.0,
            0.0f64..2000.0,
            0.0f64..2000.0,
            0.0f64..2000.0,
        )
            .prop_map(
                |(car_travel_km, electricity_kwh, flight_hours, meat_grams, dairy_grams, plant_grams)| {
                    ActivityInput {
                        car_travel_km,
                        electricity_kwh,
                        flight_hours,
                        meat_grams,
                        dairy_grams,
                        plant_grams,
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn superposition_holds(a in arb_input(), b in arb_input()) {
            let lhs = compute(&a).total_kg_co2 + compute(&b).total_kg_co2;
            let rhs = compute(&add(&a, &b)).total_kg_co2;
            prop_assert!((lhs - rhs).abs() <= 1e-9 * (1.0 + lhs.abs()));
        }

        #[test]
        fn scaling_holds(input in arb_input(), k in 0.0f64..50.0) {
            let lhs = compute(&scale(&input, k)).total_kg_co2;
            let rhs = k * compute(&input).total_kg_co2;
            prop_assert!((lhs - rhs).abs() <= 1e-9 * (1.0 + rhs.abs()));
        }

        #[test]
        fn categorize_respects_thresholds(total in -100.0f64..200.0) {
            let cat = categorize(total);
            let expected = if total < 10.0 {
                Category::Excellent
            } else if total < 20.0 {
                Category::Good
            } else if total < 30.0 {
                Category::Average
            } else {
                Category::High
            };
            prop_assert_eq!(cat, expected);
        }
    }
}
