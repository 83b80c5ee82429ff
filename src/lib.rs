use pyo3::prelude::*;
use pyo3::types::PyModule;

mod aggregation;
mod error;
mod footprint;
mod model;
mod report;
mod schema;

use footprint::{ActivityInput, Category, FootprintResult};
use model::FootprintModel;

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Activity
    let activity = PyModule::new(m.py(), "activity")?;
    activity.add("CAR_TRAVEL_KM", schema::activity::CAR_TRAVEL_KM)?;
    activity.add("ELECTRICITY_KWH", schema::activity::ELECTRICITY_KWH)?;
    activity.add("FLIGHT_HOURS", schema::activity::FLIGHT_HOURS)?;
    activity.add("MEAT_GRAMS", schema::activity::MEAT_GRAMS)?;
    activity.add("DAIRY_GRAMS", schema::activity::DAIRY_GRAMS)?;
    activity.add("PLANT_GRAMS", schema::activity::PLANT_GRAMS)?;
    m.add_submodule(&activity)?;

    // Emission
    let emission = PyModule::new(m.py(), "emission")?;
    emission.add("TOTAL_KG_CO2", schema::emission::TOTAL_KG_CO2)?;
    emission.add("CATEGORY", schema::emission::CATEGORY)?;
    emission.add("CAR_TRAVEL_KG_CO2", schema::emission::CAR_TRAVEL_KG_CO2)?;
    emission.add(
        "ELECTRICITY_KG_CO2",
        schema::emission::ELECTRICITY_KG_CO2,
    )?;
    emission.add("FLIGHTS_KG_CO2", schema::emission::FLIGHTS_KG_CO2)?;
    emission.add("MEAT_KG_CO2", schema::emission::MEAT_KG_CO2)?;
    emission.add("DAIRY_KG_CO2", schema::emission::DAIRY_KG_CO2)?;
    emission.add("PLANT_KG_CO2", schema::emission::PLANT_KG_CO2)?;
    m.add_submodule(&emission)?;

    // Category labels
    let category = PyModule::new(m.py(), "category")?;
    category.add("EXCELLENT", schema::category::EXCELLENT)?;
    category.add("GOOD", schema::category::GOOD)?;
    category.add("AVERAGE", schema::category::AVERAGE)?;
    category.add("HIGH", schema::category::HIGH)?;
    m.add_submodule(&category)?;

    // TimeSeries
    let timeseries = PyModule::new(m.py(), "timeseries")?;
    timeseries.add("DATE_TIME", schema::timeseries::DATE_TIME)?;
    m.add_submodule(&timeseries)?;

    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<FootprintModel>()?;
    m.add_class::<ActivityInput>()?;
    m.add_class::<FootprintResult>()?;
    m.add_class::<Category>()?;
    m.add_class::<crate::aggregation::Aggregation>()?;
    add_schema_exports(m)?;
    Ok(())
}
