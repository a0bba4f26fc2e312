use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// Measurement name every imported point is written under.
pub const MEASUREMENT: &str = "solar";

/// Tag key identifying the installation site.
pub const LOCATION_TAG: &str = "location";

/// Result of converting one text value.
///
/// `Defaulted` carries the zero/epoch value that replaced unparseable text, so a
/// true zero reading (`Parsed(0.0)`) stays distinguishable from a failed one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(T),
    Defaulted(T),
}

impl<T: Copy> ParseOutcome<T> {
    pub fn value(&self) -> T {
        match self {
            ParseOutcome::Parsed(v) | ParseOutcome::Defaulted(v) => *v,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, ParseOutcome::Defaulted(_))
    }
}

/// Wire-level field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Float(f32),
    Integer(i64),
}

/// The six channels of one solar controller reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarFields {
    /// Collector temperature
    pub tcol: ParseOutcome<f32>,
    /// Boiler temperature
    pub tboil: ParseOutcome<f32>,
    /// Return line temperature
    pub trl: ParseOutcome<f32>,
    /// Flow line temperature
    pub tvl: ParseOutcome<f32>,
    /// Solar pump output
    pub psol: ParseOutcome<i64>,
    /// Heating element output
    pub phe: ParseOutcome<i64>,
}

impl SolarFields {
    /// Field names in wire order.
    pub const NAMES: [&'static str; 6] = ["Tcol", "Tboil", "Trl", "Tvl", "Psol", "Phe"];

    /// All six fields as (name, value) pairs, always complete.
    pub fn entries(&self) -> [(&'static str, FieldValue); 6] {
        let values = [
            FieldValue::Float(self.tcol.value()),
            FieldValue::Float(self.tboil.value()),
            FieldValue::Float(self.trl.value()),
            FieldValue::Float(self.tvl.value()),
            FieldValue::Integer(self.psol.value()),
            FieldValue::Integer(self.phe.value()),
        ];
        std::array::from_fn(|i| (Self::NAMES[i], values[i]))
    }

    /// Names of the fields whose text could not be converted.
    pub fn defaulted_names(&self) -> Vec<&'static str> {
        let flags = [
            self.tcol.is_defaulted(),
            self.tboil.is_defaulted(),
            self.trl.is_defaulted(),
            self.tvl.is_defaulted(),
            self.psol.is_defaulted(),
            self.phe.is_defaulted(),
        ];
        Self::NAMES
            .iter()
            .zip(flags)
            .filter(|(_, defaulted)| *defaulted)
            .map(|(name, _)| *name)
            .collect()
    }
}

/// One timestamped set of solar fields, ready to be batched.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementPoint {
    pub measurement: &'static str,
    pub timestamp: ParseOutcome<DateTime<Local>>,
    pub fields: SolarFields,
}

impl MeasurementPoint {
    pub fn new(timestamp: ParseOutcome<DateTime<Local>>, fields: SolarFields) -> Self {
        Self {
            measurement: MEASUREMENT,
            timestamp,
            fields,
        }
    }

    /// Unix seconds of the point's timestamp.
    pub fn unix_seconds(&self) -> i64 {
        self.timestamp.value().timestamp()
    }
}

/// One write call's worth of points: a chunk plus everything shared across it.
#[derive(Debug, Clone, Copy)]
pub struct BatchPoints<'a> {
    pub database: &'a str,
    /// Always empty: the database's default retention policy is used.
    pub retention_policy: &'a str,
    pub tags: &'a BTreeMap<String, String>,
    pub points: &'a [MeasurementPoint],
}
