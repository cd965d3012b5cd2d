use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperatingMode {
    Summer = 0,
    Winter = 1,
    Vacation = 2,
    Party = 3,
    SecondHeatGenerator = 4,
    Cooling = 5,
}

impl OperatingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summer => "summer",
            Self::Winter => "winter",
            Self::Vacation => "vacation",
            Self::Party => "party",
            Self::SecondHeatGenerator => "second_heat_generator",
            Self::Cooling => "cooling",
        }
    }
}

impl TryFrom<i64> for OperatingMode {
    type Error = i64;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Summer),
            1 => Ok(Self::Winter),
            2 => Ok(Self::Vacation),
            3 => Ok(Self::Party),
            4 => Ok(Self::SecondHeatGenerator),
            5 => Ok(Self::Cooling),
            _ => Err(code),
        }
    }
}

impl Display for OperatingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
