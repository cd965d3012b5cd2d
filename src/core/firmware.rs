use std::fmt::{Display, Formatter};

/// Controller software generation, selects the register map.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum FirmwareVersion {
    #[value(name = "h")]
    H,

    #[value(name = "j")]
    J,

    #[value(name = "l-m", alias = "lm")]
    Lm,
}

impl FirmwareVersion {
    pub const ALL: [Self; 3] = [Self::H, Self::J, Self::Lm];
}

impl Display for FirmwareVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::H => write!(f, "H"),
            Self::J => write!(f, "J"),
            Self::Lm => write!(f, "L/M"),
        }
    }
}
