//! Status and lock code tables.

use std::borrow::Cow;

use crate::core::firmware::FirmwareVersion;

/// Translate the status code into its symbolic name.
pub fn status_name(version: FirmwareVersion, code: u16) -> Option<&'static str> {
    match version {
        FirmwareVersion::Lm => status_lm(code),
        FirmwareVersion::H | FirmwareVersion::J => status_hj(code),
    }
}

/// Translate the lock code into its symbolic name.
pub fn lock_name(version: FirmwareVersion, code: u16) -> Option<&'static str> {
    match version {
        FirmwareVersion::Lm => lock_lm(code),
        FirmwareVersion::J => lock_j(code),
        FirmwareVersion::H => lock_h(code),
    }
}

/// Symbolic name, or `unknown_<code>` when the table has no entry.
pub fn or_unknown(name: Option<&'static str>, code: u16) -> Cow<'static, str> {
    name.map_or_else(|| Cow::Owned(format!("unknown_{code}")), Cow::Borrowed)
}

const fn status_lm(code: u16) -> Option<&'static str> {
    Some(match code {
        0 => "off",
        2 => "heating",
        3 => "pool",
        4 => "hot_water",
        5 => "cooling",
        10 => "defrost",
        11 => "flow_monitoring",
        24 => "delay_mode_switch",
        30 => "locked",
        _ => return None,
    })
}

const fn status_hj(code: u16) -> Option<&'static str> {
    Some(match code {
        0 => "off",
        1 | 2 => "heat_pump_on_heating",
        3 => "heat_pump_on_pool",
        4 => "heat_pump_on_hot_water",
        5 => "heat_pump_on_heating_auxiliary",
        6 => "heat_pump_on_pool_auxiliary",
        7 => "heat_pump_on_hot_water_auxiliary",
        8 => "primary_pump_flow",
        9 => "heating_purge",
        10 => "locked",
        11 => "lower_operation_limit",
        12 => "low_pressure_limit",
        13 => "low_pressure_shutdown",
        14 => "high_pressure_safety",
        15 => "anti_cycling",
        16 => "minimum_standby",
        17 => "load_management",
        18 => "flow_monitoring",
        19 => "auxiliary_heater",
        20 => "low_pressure_brine",
        21 => "heat_pump_on_defrost",
        22 => "upper_operation_limit",
        23 => "external_lock",
        24 => "cooling_mode",
        25 => "frost_protection",
        26 => "flow_limit",
        27 => "dew_point_monitor",
        28 => "dew_point",
        29 => "passive_cooling",
        _ => return None,
    })
}

const fn lock_lm(code: u16) -> Option<&'static str> {
    Some(match code {
        0 => "none",
        2 => "flow_rate",
        5 => "function_control",
        6 => "operation_limit_auxiliary",
        7 => "system_control",
        8 => "delay_cooling_switch",
        9 => "pump_prerun",
        10 => "minimum_standby",
        11 => "load_management",
        12 => "anti_cycling",
        13 => "hot_water_post_heating",
        14 => "regenerative",
        15 => "utility_lock",
        16 => "soft_starter",
        17 => "flow_rate_monitoring",
        18 => "heat_pump_operation_limit",
        19 => "high_pressure",
        20 => "low_pressure",
        21 => "heat_source_limit",
        23 => "system_limit",
        24 => "primary_circuit_load",
        25 => "external_lock",
        29 => "inverter",
        31 => "warm_up",
        33 => "evd_initialization",
        34 => "auxiliary_heater_enabled",
        35 => "error_active",
        _ => return None,
    })
}

const fn lock_j(code: u16) -> Option<&'static str> {
    Some(match code {
        0 => "none",
        1 => "operation_limit_auxiliary",
        2 => "heat_pump_operation_limit",
        3 => "regenerative",
        5 => "hot_water_post_heating",
        6 => "system_control",
        7 => "utility_lock",
        9 => "high_pressure",
        10 => "low_pressure",
        11 => "flow_rate",
        12 => "soft_starter",
        36 => "pump_prerun",
        37 => "minimum_standby",
        38 => "load_management",
        39 => "anti_cycling",
        40 => "heat_source_limit",
        41 => "external_lock",
        42 => "auxiliary_heater",
        43 => "error_active",
        _ => return None,
    })
}

const fn lock_h(code: u16) -> Option<&'static str> {
    Some(match code {
        0 => "none",
        1 => "outside_temperature",
        2 => "bivalent_alternative",
        3 => "bivalent_regenerative",
        4 => "return_temperature",
        5 => "hot_water",
        6 => "system_control",
        7 => "utility_lock",
        _ => return None,
    })
}
