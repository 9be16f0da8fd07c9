//! The data classes a batch can ask for, each with its profile register code and
//! field schema. Field order here is the order records are built and serialized in.

use super::types::{FieldSpec, ValueType::*};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

static SINGLE_REGISTER: &[FieldSpec] = &[FieldSpec::new(
    "CumulativeEnergyWhImport",
    "cumulative_energy_wh_import",
    "1.0.1.8.0.255",
    Decimal,
)];

#[rustfmt::skip]
static BLOCK_LOAD_PROFILE: &[FieldSpec] = &[
    FieldSpec::new("DateTime", "date_time", "0.0.1.0.0.255", Text),
    FieldSpec::new("AverageVoltage", "average_voltage", "1.0.12.27.0.255", Decimal),
    FieldSpec::new("BlockEnergyWhImport", "block_energy_wh_import", "1.0.1.29.0.255", Decimal),
    FieldSpec::new("BlockEnergyVAhImport", "block_energy_vah_import", "1.0.9.29.0.255", Decimal),
    FieldSpec::new("BlockEnergyWhExport", "block_energy_wh_export", "1.0.2.29.0.255", Decimal),
    FieldSpec::new("BlockEnergyVAhExport", "block_energy_vah_export", "1.0.10.29.0.255", Decimal),
    FieldSpec::new("AverageCurrent", "average_current", "1.0.11.27.0.255", Decimal),
    FieldSpec::new("MeterHealthIndicator", "meter_health_indicator", "0.0.96.10.1.255", SmallUnsigned),
];

#[rustfmt::skip]
static DAILY_LOAD_PROFILE: &[FieldSpec] = &[
    FieldSpec::new("DateTime", "date_time", "0.0.1.0.0.255", Text),
    FieldSpec::new("CumulativeEnergyWhExport", "cumulative_energy_wh_export", "1.0.2.8.0.255", Decimal),
    FieldSpec::new("CumulativeEnergyVAhExport", "cumulative_energy_vah_export", "1.0.10.8.0.255", Decimal),
    FieldSpec::new("CumulativeEnergyWhImport", "cumulative_energy_wh_import", "1.0.1.8.0.255", Decimal),
    FieldSpec::new("CumulativeEnergyVAhImport", "cumulative_energy_vah_import", "1.0.9.8.0.255", Decimal),
];

// MD values and their timestamps share a register. A table with two such columns gives
// the first to the value and the second to its timestamp; with one column both read it.
#[rustfmt::skip]
static BILLING_PROFILE: &[FieldSpec] = &[
    FieldSpec::new("BillingDate", "billing_date", "0.0.0.1.2.255", Text),
    FieldSpec::new("AveragePFForBillingPeriod", "average_pf_for_billing_period", "1.0.13.0.0.255", Decimal),
    FieldSpec::new("CumEnergyWhImport", "cum_energy_wh_import", "1.0.1.8.0.255", Decimal),
    FieldSpec::new("CumEnergyWhTZ1", "cum_energy_wh_tz1", "1.0.1.8.1.255", Decimal),
    FieldSpec::new("CumEnergyWhTZ2", "cum_energy_wh_tz2", "1.0.1.8.2.255", Decimal),
    FieldSpec::new("CumEnergyWhTZ3", "cum_energy_wh_tz3", "1.0.1.8.3.255", Decimal),
    FieldSpec::new("CumEnergyWhTZ4", "cum_energy_wh_tz4", "1.0.1.8.4.255", Decimal),
    FieldSpec::new("CumEnergyVAhImport", "cum_energy_vah_import", "1.0.9.8.0.255", Decimal),
    FieldSpec::new("CumEnergyVAhTZ1", "cum_energy_vah_tz1", "1.0.9.8.1.255", Decimal),
    FieldSpec::new("CumEnergyVAhTZ2", "cum_energy_vah_tz2", "1.0.9.8.2.255", Decimal),
    FieldSpec::new("CumEnergyVAhTZ3", "cum_energy_vah_tz3", "1.0.9.8.3.255", Decimal),
    FieldSpec::new("CumEnergyVAhTZ4", "cum_energy_vah_tz4", "1.0.9.8.4.255", Decimal),
    FieldSpec::new("MDW", "md_w", "1.0.1.6.0.255", Decimal),
    FieldSpec::new("MDWDateTime", "md_w_date_time", "1.0.1.6.0.255", Text),
    FieldSpec::new("MDVA", "md_va", "1.0.9.6.0.255", Decimal),
    FieldSpec::new("MDVADateTime", "md_va_date_time", "1.0.9.6.0.255", Text),
    FieldSpec::new("BillingPowerOnDuration", "billing_power_on_duration", "0.0.94.91.13.255", Decimal),
    FieldSpec::new("CumEnergyWhExport", "cum_energy_wh_export", "1.0.2.8.0.255", Decimal),
    FieldSpec::new("CumEnergyVAhExport", "cum_energy_vah_export", "1.0.10.8.0.255", Decimal),
];

#[rustfmt::skip]
static INSTANTANEOUS_PROFILE: &[FieldSpec] = &[
    FieldSpec::new("DateTime", "date_time", "0.0.1.0.0.255", Text),
    FieldSpec::new("Voltage", "voltage", "1.0.12.7.0.255", Decimal),
    FieldSpec::new("PhaseCurrent", "phase_current", "1.0.11.7.0.255", Decimal),
    FieldSpec::new("NeutralCurrent", "neutral_current", "1.0.91.7.0.255", Decimal),
    FieldSpec::new("SignedPowerFactor", "signed_power_factor", "1.0.13.7.0.255", Decimal),
    FieldSpec::new("Frequency", "frequency", "1.0.14.7.0.255", Decimal),
    FieldSpec::new("ApparentPower", "apparent_power", "1.0.9.7.0.255", Decimal),
    FieldSpec::new("ActivePower", "active_power", "1.0.1.7.0.255", Decimal),
    FieldSpec::new("CumEnergyWh", "cum_energy_wh", "1.0.1.8.0.255", Decimal),
    FieldSpec::new("CumEnergyVAh", "cum_energy_vah", "1.0.9.8.0.255", Decimal),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataClass {
    SingleRegister,
    BlockLoadProfile,
    DailyLoadProfile,
    BillingProfile,
    InstantaneousProfile,
}

impl DataClass {
    pub const ALL: [DataClass; 5] = [
        DataClass::SingleRegister,
        DataClass::BlockLoadProfile,
        DataClass::DailyLoadProfile,
        DataClass::BillingProfile,
        DataClass::InstantaneousProfile,
    ];

    /// Register code the driver reads for this class.
    pub fn register_code(self) -> &'static str {
        match self {
            DataClass::SingleRegister => "1.0.1.8.0.255",
            DataClass::BlockLoadProfile => "1.0.99.1.0.255",
            DataClass::DailyLoadProfile => "1.0.99.2.0.255",
            DataClass::BillingProfile => "1.0.98.1.0.255",
            DataClass::InstantaneousProfile => "1.0.94.91.0.255",
        }
    }

    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            DataClass::SingleRegister => SINGLE_REGISTER,
            DataClass::BlockLoadProfile => BLOCK_LOAD_PROFILE,
            DataClass::DailyLoadProfile => DAILY_LOAD_PROFILE,
            DataClass::BillingProfile => BILLING_PROFILE,
            DataClass::InstantaneousProfile => INSTANTANEOUS_PROFILE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataClass::SingleRegister => "single_register",
            DataClass::BlockLoadProfile => "block_load_profile",
            DataClass::DailyLoadProfile => "daily_load_profile",
            DataClass::BillingProfile => "billing_profile",
            DataClass::InstantaneousProfile => "instantaneous_profile",
        }
    }

    pub fn from_register_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.into_iter().find(|c| c.register_code() == code)
    }
}

impl fmt::Display for DataClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown data class `{}`", s))
    }
}
