//! Logical measurements and their per-firmware register definitions.

mod definition;
pub mod messages;

use std::fmt::{Display, Formatter};

use clap::ValueEnum;
use enumset::EnumSet;
use serde::Serialize;
use tokio_modbus::Address;

pub use self::definition::{Layout, RegisterDefinition, Unit};
use crate::core::{feature::Feature, firmware::FirmwareVersion};

/// Logical measurement exposed by the controller.
#[derive(Debug, Hash, PartialOrd, Ord, Serialize, clap::ValueEnum, enumset::EnumSetType)]
#[value(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    StatusCode,
    LockCode,
    ErrorCode,
    SensorErrorCode,

    FlowTemperature,
    ReturnTemperature,
    OutsideTemperature,
    HotWaterTemperature,
    HeatSourceInletTemperature,
    HeatSourceOutletTemperature,
    RoomTemperature,
    FlowSetpoint,
    HotWaterSetpoint,
    EvaporatorTemperature,
    CondenserTemperature,
    SuctionGasTemperature,
    DischargeGasTemperature,

    HighPressure,
    LowPressure,
    BrinePressure,
    WaterPressure,

    CurrentPowerConsumption,
    CurrentHeatingPower,
    PvSurplus,
    TotalEnergyConsumed,
    TotalHeatGenerated,
    HeatingEnergy,
    HotWaterEnergy,
    CoolingEnergy,
    PoolEnergy,
    EnvironmentalEnergy,

    CompressorRuntimeTotal,
    CompressorStarts,
    HeatingRuntime,
    HotWaterRuntime,
    CoolingRuntime,
    AuxiliaryHeaterRuntime,
    DefrostCycles,

    ExternalLockInput,
    UtilityLockInput,
    CompressorOutput,
    CirculationPumpOutput,
    AuxiliaryHeaterOutput,

    OperatingMode,
    PartyHours,
    VacationDays,
    VentilationStage,
    BoostVentilationTime,

    Hc1ComfortSetpoint,
    Hc1ReducedSetpoint,
    Hc1HeatingCurve,
    Hc2ComfortSetpoint,
    Hc2ReducedSetpoint,
    HotWaterComfortSetpoint,
    HotWaterReducedSetpoint,
}

/// Whether and how a measurement may be written.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,

    /// Writable within the inclusive range, in scaled units.
    Bounded { min: i64, max: i64 },
}

impl Measurement {
    /// Register definition on the firmware version, the address is `None` when not supported.
    ///
    /// PV surplus, pool and environmental energy and the second heating circuit are known to the
    /// controller but have no documented register yet, so they stay unaddressed on every version.
    pub const fn definition(self, version: FirmwareVersion) -> RegisterDefinition {
        use RegisterDefinition as D;

        const fn all(definition: RegisterDefinition) -> [RegisterDefinition; 3] {
            [definition, definition, definition]
        }

        const fn j_and_lm(definition: RegisterDefinition) -> [RegisterDefinition; 3] {
            [D::ABSENT, definition, definition]
        }

        const fn lm_only(definition: RegisterDefinition) -> [RegisterDefinition; 3] {
            [D::ABSENT, D::ABSENT, definition]
        }

        let [h, j, lm] = match self {
            Self::StatusCode => [D::CODE.at(14), D::CODE.at(43), D::CODE.at(103)],
            Self::LockCode => [D::CODE.at(94), D::CODE.at(59), D::CODE.at(104)],
            Self::ErrorCode => [D::CODE.at(13), D::CODE.at(42), D::CODE.at(105)],
            Self::SensorErrorCode => lm_only(D::CODE.at(106)),

            Self::FlowTemperature => all(D::CELSIUS.at(10)),
            Self::ReturnTemperature => all(D::CELSIUS.at(11)),
            Self::OutsideTemperature => all(D::CELSIUS.at(12)),
            Self::HotWaterTemperature => all(D::CELSIUS.at(13)),
            Self::HeatSourceInletTemperature => all(D::CELSIUS.at(14)),
            Self::HeatSourceOutletTemperature => all(D::CELSIUS.at(15)),
            Self::RoomTemperature => all(D::CELSIUS.at(16)),
            Self::FlowSetpoint => all(D::CELSIUS.at(17)),
            Self::HotWaterSetpoint => all(D::CELSIUS.at(18)),
            Self::EvaporatorTemperature => all(D::CELSIUS.at(20)),
            Self::CondenserTemperature => all(D::CELSIUS.at(21)),
            Self::SuctionGasTemperature => all(D::CELSIUS.at(22)),
            Self::DischargeGasTemperature => all(D::CELSIUS.at(23)),

            Self::HighPressure => all(D::BAR.at(30)),
            Self::LowPressure => all(D::BAR.at(31)),
            Self::BrinePressure => all(D::BAR.at(32)),
            Self::WaterPressure => all(D::BAR.at(33)),

            Self::CurrentPowerConsumption => all(D::WATTS.at(70)),
            Self::CurrentHeatingPower => all(D::WATTS.at(71)),
            Self::PvSurplus => all(D::WATTS),
            Self::TotalEnergyConsumed => all(D::KWH_32.at(80)),
            Self::TotalHeatGenerated => all(D::KWH_32.at(82)),
            Self::HeatingEnergy => all(D::KWH_32.at(84)),
            Self::HotWaterEnergy => all(D::KWH_32.at(86)),
            Self::CoolingEnergy => all(D::KWH_32.at(88)),
            Self::PoolEnergy => all(D::KWH_DIGITS),
            Self::EnvironmentalEnergy => all(D::KWH_DIGITS),

            Self::CompressorRuntimeTotal => all(D::HOURS_32.at(50)),
            Self::CompressorStarts => all(D::COUNT_32.at(52)),
            Self::HeatingRuntime => all(D::HOURS_32.at(54)),
            Self::HotWaterRuntime => all(D::HOURS_32.at(56)),
            Self::CoolingRuntime => all(D::HOURS_32.at(58)),
            Self::AuxiliaryHeaterRuntime => all(D::HOURS_32.at(60)),
            Self::DefrostCycles => all(D::COUNT_32.at(62)),

            Self::ExternalLockInput => lm_only(D::FLAG.at(90)),
            Self::UtilityLockInput => lm_only(D::FLAG.at(91)),
            Self::CompressorOutput => lm_only(D::FLAG.at(92)),
            Self::CirculationPumpOutput => lm_only(D::FLAG.at(93)),
            Self::AuxiliaryHeaterOutput => lm_only(D::FLAG.at(94)),

            Self::OperatingMode => j_and_lm(D::MODE.at(5015)),
            Self::PartyHours => j_and_lm(D::HOURS.at(5016)),
            Self::VacationDays => j_and_lm(D::DAYS.at(5017)),
            Self::VentilationStage => j_and_lm(D::STAGE.at(5034)),
            Self::BoostVentilationTime => j_and_lm(D::MINUTES.at(127)),

            Self::Hc1ComfortSetpoint => lm_only(D::CELSIUS.at(200)),
            Self::Hc1ReducedSetpoint => lm_only(D::CELSIUS.at(201)),
            Self::Hc1HeatingCurve => lm_only(D::CURVE.at(202)),
            Self::Hc2ComfortSetpoint => all(D::CELSIUS),
            Self::Hc2ReducedSetpoint => all(D::CELSIUS),
            Self::HotWaterComfortSetpoint => lm_only(D::CELSIUS.at(210)),
            Self::HotWaterReducedSetpoint => lm_only(D::CELSIUS.at(211)),
        };

        match version {
            FirmwareVersion::H => h,
            FirmwareVersion::J => j,
            FirmwareVersion::Lm => lm,
        }
    }

    /// Register definition if the firmware version supports the measurement.
    pub fn lookup(self, version: FirmwareVersion) -> Option<RegisterDefinition> {
        let definition = self.definition(version);
        definition.address.map(|_| definition)
    }

    /// Register address and definition if the firmware version supports the measurement.
    pub fn locate(self, version: FirmwareVersion) -> Option<(Address, RegisterDefinition)> {
        let definition = self.definition(version);
        definition.address.map(|address| (address, definition))
    }

    /// Installation feature the measurement depends on.
    pub const fn feature(self) -> Option<Feature> {
        match self {
            Self::CoolingEnergy | Self::CoolingRuntime => Some(Feature::Cooling),
            Self::HotWaterTemperature
            | Self::HotWaterSetpoint
            | Self::HotWaterEnergy
            | Self::HotWaterRuntime
            | Self::HotWaterComfortSetpoint
            | Self::HotWaterReducedSetpoint => Some(Feature::HotWater),
            Self::PoolEnergy => Some(Feature::Pool),
            Self::Hc2ComfortSetpoint | Self::Hc2ReducedSetpoint => {
                Some(Feature::SecondHeatingCircuit)
            }
            Self::DefrostCycles => Some(Feature::Defrost),
            Self::BrinePressure => Some(Feature::Brine),
            _ => None,
        }
    }

    pub const fn access(self) -> Access {
        match self {
            Self::OperatingMode
            | Self::Hc1ComfortSetpoint
            | Self::Hc1ReducedSetpoint
            | Self::Hc1HeatingCurve
            | Self::HotWaterComfortSetpoint
            | Self::HotWaterReducedSetpoint => Access::ReadWrite,
            Self::PartyHours => Access::Bounded { min: 0, max: 72 },
            Self::VacationDays => Access::Bounded { min: 0, max: 150 },
            Self::VentilationStage => Access::Bounded { min: 0, max: 5 },
            Self::BoostVentilationTime => Access::Bounded { min: 15, max: 90 },
            _ => Access::ReadOnly,
        }
    }

    /// Whether the measurement is read and exposed for the firmware and the installed features.
    pub fn is_available(self, version: FirmwareVersion, features: EnumSet<Feature>) -> bool {
        self.lookup(version).is_some() && self.feature().is_none_or(|it| features.contains(it))
    }
}

impl Display for Measurement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => write!(f, "{self:?}"),
        }
    }
}

/// Operating-data groups in the order they are read.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Group {
    Temperatures,
    Pressures,
    Energy,
    Runtimes,
    Io,
    OperatingMode,
    Settings,
}

impl Group {
    pub const ALL: [Self; 7] = [
        Self::Temperatures,
        Self::Pressures,
        Self::Energy,
        Self::Runtimes,
        Self::Io,
        Self::OperatingMode,
        Self::Settings,
    ];

    pub const fn measurements(self) -> &'static [Measurement] {
        use Measurement as M;

        match self {
            Self::Temperatures => &[
                M::FlowTemperature,
                M::ReturnTemperature,
                M::OutsideTemperature,
                M::HotWaterTemperature,
                M::HeatSourceInletTemperature,
                M::HeatSourceOutletTemperature,
                M::RoomTemperature,
                M::FlowSetpoint,
                M::HotWaterSetpoint,
                M::EvaporatorTemperature,
                M::CondenserTemperature,
                M::SuctionGasTemperature,
                M::DischargeGasTemperature,
            ],
            Self::Pressures => &[M::HighPressure, M::LowPressure, M::BrinePressure, M::WaterPressure],
            Self::Energy => &[
                M::CurrentPowerConsumption,
                M::CurrentHeatingPower,
                M::PvSurplus,
                M::TotalEnergyConsumed,
                M::TotalHeatGenerated,
                M::HeatingEnergy,
                M::HotWaterEnergy,
                M::CoolingEnergy,
                M::PoolEnergy,
                M::EnvironmentalEnergy,
            ],
            Self::Runtimes => &[
                M::CompressorRuntimeTotal,
                M::CompressorStarts,
                M::HeatingRuntime,
                M::HotWaterRuntime,
                M::CoolingRuntime,
                M::AuxiliaryHeaterRuntime,
                M::DefrostCycles,
            ],
            Self::Io => &[
                M::ExternalLockInput,
                M::UtilityLockInput,
                M::CompressorOutput,
                M::CirculationPumpOutput,
                M::AuxiliaryHeaterOutput,
            ],
            Self::OperatingMode => &[
                M::OperatingMode,
                M::PartyHours,
                M::VacationDays,
                M::VentilationStage,
                M::BoostVentilationTime,
            ],
            Self::Settings => &[
                M::Hc1ComfortSetpoint,
                M::Hc1ReducedSetpoint,
                M::Hc1HeatingCurve,
                M::Hc2ComfortSetpoint,
                M::Hc2ReducedSetpoint,
                M::HotWaterComfortSetpoint,
                M::HotWaterReducedSetpoint,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_every_measurement_resolves_for_every_version() {
        for measurement in EnumSet::<Measurement>::all() {
            for version in FirmwareVersion::ALL {
                let definition = measurement.definition(version);
                assert_ne!(definition.address, Some(0), "{measurement} on {version}");
                assert!(definition.scale > 0.0, "{measurement} on {version}");
                assert_eq!(
                    measurement.lookup(version).is_some(),
                    definition.address.is_some(),
                    "{measurement} on {version}",
                );
            }
        }
    }

    #[test]
    fn test_core_status_addresses() {
        let addresses = |measurement: Measurement| {
            FirmwareVersion::ALL.map(|version| measurement.definition(version).address)
        };
        assert_eq!(addresses(Measurement::StatusCode), [Some(14), Some(43), Some(103)]);
        assert_eq!(addresses(Measurement::LockCode), [Some(94), Some(59), Some(104)]);
        assert_eq!(addresses(Measurement::ErrorCode), [Some(13), Some(42), Some(105)]);
        assert_eq!(addresses(Measurement::SensorErrorCode), [None, None, Some(106)]);
    }

    #[test]
    fn test_groups_cover_operating_data_once() {
        let mut seen = HashSet::new();
        for group in Group::ALL {
            for measurement in group.measurements() {
                assert!(seen.insert(*measurement), "{measurement} listed twice");
            }
        }
        let core = [
            Measurement::StatusCode,
            Measurement::LockCode,
            Measurement::ErrorCode,
            Measurement::SensorErrorCode,
        ];
        for measurement in EnumSet::<Measurement>::all() {
            assert_ne!(seen.contains(&measurement), core.contains(&measurement), "{measurement}");
        }
    }

    #[test]
    fn test_addresses_are_unique_per_version() {
        for version in FirmwareVersion::ALL {
            let mut seen = HashSet::new();
            for group in Group::ALL {
                for measurement in group.measurements() {
                    if let Some(definition) = measurement.lookup(version) {
                        let address = definition.address.unwrap();
                        for offset in 0..definition.n_words() {
                            assert!(seen.insert(address + offset), "{measurement} on {version}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_version_dependent_measurements() {
        assert!(Measurement::OperatingMode.lookup(FirmwareVersion::H).is_none());
        assert_eq!(
            Measurement::OperatingMode.lookup(FirmwareVersion::J).and_then(|it| it.address),
            Some(5015),
        );
        assert!(Measurement::SensorErrorCode.lookup(FirmwareVersion::J).is_none());
    }

    #[test]
    fn test_undocumented_registers_stay_unaddressed() {
        let unaddressed = [
            Measurement::PvSurplus,
            Measurement::PoolEnergy,
            Measurement::EnvironmentalEnergy,
            Measurement::Hc2ComfortSetpoint,
            Measurement::Hc2ReducedSetpoint,
        ];
        for measurement in unaddressed {
            assert_eq!(measurement.access(), Access::ReadOnly, "{measurement}");
            for version in FirmwareVersion::ALL {
                assert!(measurement.lookup(version).is_none(), "{measurement} on {version}");
            }
        }
        assert_eq!(Measurement::PoolEnergy.definition(FirmwareVersion::Lm).n_words(), 3);
    }

    #[test]
    fn test_feature_gating() {
        let features = Feature::HotWater | Feature::Defrost;
        assert!(Measurement::HotWaterEnergy.is_available(FirmwareVersion::J, features));
        assert!(!Measurement::CoolingEnergy.is_available(FirmwareVersion::J, features));
        assert!(!Measurement::BrinePressure.is_available(FirmwareVersion::Lm, features));
        assert!(Measurement::Hc1ComfortSetpoint.is_available(FirmwareVersion::Lm, features));
        assert!(!Measurement::PoolEnergy.is_available(FirmwareVersion::Lm, Feature::Pool.into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Measurement::CurrentHeatingPower.to_string(), "current_heating_power");
        assert_eq!(Measurement::Hc1ComfortSetpoint.to_string(), "hc1_comfort_setpoint");
    }
}
