use iso8601_timestamp::Timestamp;

auto_derived!(
    /// Current rain context for the monitored city
    pub struct WeatherSummary {
        /// Forecast rain volume over the next 24 hours (mm)
        pub rain_24h: f64,
        /// Maximum probability of precipitation over the next 24 hours (%)
        pub rain_chance: u8,
        /// Current temperature (°C)
        pub temp: i32,
        /// Current relative humidity (%)
        pub humidity: u8,
        /// Status text for the dashboard
        pub current: String,
        /// When this summary was computed
        #[schema(value_type = String)]
        pub last_updated: Timestamp,
    }
);

impl WeatherSummary {
    /// Degraded payload served when the upstream weather network is down
    pub fn unavailable() -> WeatherSummary {
        WeatherSummary {
            rain_24h: 0.0,
            rain_chance: 0,
            temp: 0,
            humidity: 0,
            current: "Unavailable".to_string(),
            last_updated: Timestamp::now_utc(),
        }
    }
}
