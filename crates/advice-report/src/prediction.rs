/// Oyster production prediction.
///
/// Production (metric tons) =
///   0.268·salinity + 0.567·technique + 0.436·typhoons + 0.223·floods − 4.595,
/// clamped at zero.
use std::fmt;

use crate::error::PredictionError;

const SALINITY_COEF: f64 = 0.268;
const TECHNIQUE_COEF: f64 = 0.567;
const TYPHOON_COEF: f64 = 0.436;
const FLOOD_COEF: f64 = 0.223;
const INTERCEPT: f64 = -4.595;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FarmingTechnique {
    Raft,
    Stake,
    RaftAndStake,
}

impl FarmingTechnique {
    /// Numeric code used by the formula: 1 = raft, 2 = stake, 3 = both.
    pub fn code(self) -> u8 {
        match self {
            FarmingTechnique::Raft => 1,
            FarmingTechnique::Stake => 2,
            FarmingTechnique::RaftAndStake => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FarmingTechnique::Raft => "Raft method",
            FarmingTechnique::Stake => "Stake method",
            FarmingTechnique::RaftAndStake => "Both Raft and Stake",
        }
    }

    pub fn from_code(code: i64) -> Result<Self, PredictionError> {
        match code {
            1 => Ok(FarmingTechnique::Raft),
            2 => Ok(FarmingTechnique::Stake),
            3 => Ok(FarmingTechnique::RaftAndStake),
            other => Err(PredictionError::UnknownTechnique(other)),
        }
    }
}

impl fmt::Display for FarmingTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four scalar inputs to the formula, already validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarmInputs {
    /// Salinity in parts per thousand.
    pub salinity: f64,
    pub technique: FarmingTechnique,
    /// Typhoon events during the production period.
    pub typhoon_count: u32,
    /// Flood events during the production period.
    pub flood_count: u32,
}

impl FarmInputs {
    pub fn new(
        salinity: f64,
        technique_code: i64,
        typhoon_count: u32,
        flood_count: u32,
    ) -> Result<Self, PredictionError> {
        if !salinity.is_finite() {
            return Err(PredictionError::InvalidSalinity(salinity));
        }
        Ok(Self {
            salinity,
            technique: FarmingTechnique::from_code(technique_code)?,
            typhoon_count,
            flood_count,
        })
    }
}

/// A computed prediction together with the inputs that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericResult {
    value: f64,
    pub inputs: FarmInputs,
}

impl NumericResult {
    /// Wrap an externally computed value. Negative, `-0.0` and NaN values clamp to zero.
    pub fn new(value: f64, inputs: FarmInputs) -> Self {
        Self {
            value: non_negative(value),
            inputs,
        }
    }

    /// Predicted production in metric tons, never negative.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value formatted to two decimals for display.
    pub fn display_value(&self) -> String {
        format!("{:.2}", self.value)
    }
}

pub fn predict(inputs: FarmInputs) -> NumericResult {
    let production = SALINITY_COEF * inputs.salinity
        + TECHNIQUE_COEF * f64::from(inputs.technique.code())
        + TYPHOON_COEF * f64::from(inputs.typhoon_count)
        + FLOOD_COEF * f64::from(inputs.flood_count)
        + INTERCEPT;
    NumericResult::new(production, inputs)
}

fn non_negative(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}
