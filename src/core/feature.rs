use enumset::EnumSet;

/// Optional installation feature, gates the measurements tied to it.
#[derive(Debug, Hash, clap::ValueEnum, enumset::EnumSetType)]
pub enum Feature {
    Cooling,
    HotWater,
    Pool,
    SecondHeatingCircuit,
    Defrost,
    Brine,
}

impl Feature {
    pub fn default_set() -> EnumSet<Self> {
        Self::HotWater | Self::Defrost
    }
}
