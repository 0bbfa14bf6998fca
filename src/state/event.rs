use chrono::NaiveDateTime;

/// A single earthquake bulletin, as extracted from its detail page
///
/// Datetimes are the local wall-clock times printed on the bulletin.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeEvent {
    pub recorded_at: NaiveDateTime,
    /// Depth of focus in kilometres
    pub depth: u32,
    pub origin: String,
    pub magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub damage_expected: bool,
    pub aftershock_expected: bool,
    pub intensity: String,
    pub issued_on: NaiveDateTime,
    pub prepared_by: String,
}
