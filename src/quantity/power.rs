use std::fmt::{Debug, Display, Formatter};

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub struct Watts(pub f64);

impl Display for Watts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0} W", self.0)
    }
}

impl Debug for Watts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}W", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(Watts(2499.6).to_string(), "2500 W");
        assert_eq!(format!("{:?}", Watts(3000.0)), "3000W");
    }

    #[test]
    fn test_ordering() {
        assert!(Watts(1999.0) < Watts(2000.0));
        assert!(Watts(2000.0) >= Watts(2000.0));
    }
}
