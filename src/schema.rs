/// Column-name and label constants for the carbon-tracekit schema.
/// Single source of truth - exported to Python via PyO3.

// ── Activity columns ────────────────────────────────────────────────────────
pub mod activity {
    pub const CAR_TRAVEL_KM: &str = "car_travel_km";
    pub const ELECTRICITY_KWH: &str = "electricity_kwh";
    pub const FLIGHT_HOURS: &str = "flight_hours";
    pub const MEAT_GRAMS: &str = "meat_grams";
    pub const DAIRY_GRAMS: &str = "dairy_grams";
    pub const PLANT_GRAMS: &str = "plant_grams";

    pub const ALL: [&str; 6] = [
        CAR_TRAVEL_KM,
        ELECTRICITY_KWH,
        FLIGHT_HOURS,
        MEAT_GRAMS,
        DAIRY_GRAMS,
        PLANT_GRAMS,
    ];
}

// ── Computed emission columns ───────────────────────────────────────────────
pub mod emission {
    pub const TOTAL_KG_CO2: &str = "total_kg_co2";
    pub const CATEGORY: &str = "category";

    pub const CAR_TRAVEL_KG_CO2: &str = "car_travel_kg_co2";
    pub const ELECTRICITY_KG_CO2: &str = "electricity_kg_co2";
    pub const FLIGHTS_KG_CO2: &str = "flights_kg_co2";
    pub const MEAT_KG_CO2: &str = "meat_kg_co2";
    pub const DAIRY_KG_CO2: &str = "dairy_kg_co2";
    pub const PLANT_KG_CO2: &str = "plant_kg_co2";

    pub const BREAKDOWN: [&str; 6] = [
        CAR_TRAVEL_KG_CO2,
        ELECTRICITY_KG_CO2,
        FLIGHTS_KG_CO2,
        MEAT_KG_CO2,
        DAIRY_KG_CO2,
        PLANT_KG_CO2,
    ];
}

// ── Category labels ─────────────────────────────────────────────────────────
pub mod category {
    pub const EXCELLENT: &str = "Excellent";
    pub const GOOD: &str = "Good";
    pub const AVERAGE: &str = "Average";
    pub const HIGH: &str = "High";

    pub const ALL: [&str; 4] = [EXCELLENT, GOOD, AVERAGE, HIGH];
}

// ── Time series columns ─────────────────────────────────────────────────────
pub mod timeseries {
    pub const DATE_TIME: &str = "date_time";
}
