use tokio_modbus::Address;

use crate::{api::modbus::RegisterKind, core::decode::Decoder};

/// How the words of a register are laid out.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Layout {
    /// One 16-bit word.
    Single,

    /// Two words, high word first.
    Double,

    /// Custom multi-word encoding.
    Packed(Decoder),
}

impl Layout {
    pub const fn n_words(self) -> u16 {
        match self {
            Self::Single => 1,
            Self::Double => 2,
            Self::Packed(decoder) => decoder.n_words(),
        }
    }
}

/// Physical unit of a decoded value, also drives its presentation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Unit {
    /// Raw controller code.
    Code,
    Celsius,
    Bar,
    Watts,
    KilowattHours,
    Hours,
    Days,
    Minutes,
    Count,

    /// Dimensionless scaled value, such as the heating curve.
    Ratio,

    /// Binary input or output.
    Flag,

    /// [`crate::core::operating_mode::OperatingMode`] code.
    Mode,
}

impl Unit {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Bar => "bar",
            Self::Watts => "W",
            Self::KilowattHours => "kWh",
            Self::Hours => "h",
            Self::Days => "d",
            Self::Minutes => "min",
            Self::Code | Self::Count | Self::Ratio | Self::Flag | Self::Mode => "",
        }
    }

    /// Whether the scaled value is an integer count of the unit.
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Code | Self::Watts | Self::Hours | Self::Days | Self::Minutes | Self::Count,
        )
    }
}

/// Where and how to read a measurement on a specific firmware version.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RegisterDefinition {
    /// `None` when the firmware does not provide the measurement.
    pub address: Option<Address>,

    pub kind: RegisterKind,
    pub scale: f64,
    pub signed: bool,
    pub layout: Layout,
    pub unit: Unit,
}

impl RegisterDefinition {
    const fn holding(scale: f64, signed: bool, layout: Layout, unit: Unit) -> Self {
        Self { address: None, kind: RegisterKind::Holding, scale, signed, layout, unit }
    }

    pub const CODE: Self = Self::holding(1.0, false, Layout::Single, Unit::Code);
    pub const CELSIUS: Self = Self::holding(0.1, true, Layout::Single, Unit::Celsius);
    pub const BAR: Self = Self::holding(0.01, false, Layout::Single, Unit::Bar);
    pub const WATTS: Self = Self::holding(1.0, false, Layout::Single, Unit::Watts);
    pub const KWH_32: Self = Self::holding(0.1, false, Layout::Double, Unit::KilowattHours);
    pub const KWH_DIGITS: Self =
        Self::holding(1.0, false, Layout::Packed(Decoder::Digits12), Unit::KilowattHours);
    pub const HOURS_32: Self = Self::holding(1.0, true, Layout::Double, Unit::Hours);
    pub const COUNT_32: Self = Self::holding(1.0, true, Layout::Double, Unit::Count);
    pub const FLAG: Self = Self::holding(1.0, false, Layout::Single, Unit::Flag);
    pub const MODE: Self = Self::holding(1.0, false, Layout::Single, Unit::Mode);
    pub const HOURS: Self = Self::holding(1.0, false, Layout::Single, Unit::Hours);
    pub const DAYS: Self = Self::holding(1.0, false, Layout::Single, Unit::Days);
    pub const MINUTES: Self = Self::holding(1.0, false, Layout::Single, Unit::Minutes);
    pub const STAGE: Self = Self::holding(1.0, false, Layout::Single, Unit::Count);
    pub const CURVE: Self = Self::holding(0.01, true, Layout::Single, Unit::Ratio);

    /// Not available on the firmware.
    pub const ABSENT: Self = Self::CODE;

    /// Place the definition at the address.
    pub const fn at(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub const fn n_words(&self) -> u16 {
        self.layout.n_words()
    }
}
