use std::fmt;
use std::str::FromStr;

use lumenrelay_frame::Rgb;

/// Order in which a strip expects the three colour bytes of each LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorOrder {
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    /// APA102 datasheet order.
    #[default]
    Bgr,
}

impl ColorOrder {
    pub const ALL: [ColorOrder; 6] = [
        ColorOrder::Rgb,
        ColorOrder::Rbg,
        ColorOrder::Grb,
        ColorOrder::Gbr,
        ColorOrder::Brg,
        ColorOrder::Bgr,
    ];

    /// Arrange a colour into wire order.
    pub fn arrange(self, c: Rgb) -> [u8; 3] {
        match self {
            ColorOrder::Rgb => [c.r, c.g, c.b],
            ColorOrder::Rbg => [c.r, c.b, c.g],
            ColorOrder::Grb => [c.g, c.r, c.b],
            ColorOrder::Gbr => [c.g, c.b, c.r],
            ColorOrder::Brg => [c.b, c.r, c.g],
            ColorOrder::Bgr => [c.b, c.g, c.r],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorOrder::Rgb => "rgb",
            ColorOrder::Rbg => "rbg",
            ColorOrder::Grb => "grb",
            ColorOrder::Gbr => "gbr",
            ColorOrder::Brg => "brg",
            ColorOrder::Bgr => "bgr",
        }
    }
}

impl fmt::Display for ColorOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        ColorOrder::ALL
            .into_iter()
            .find(|order| order.as_str() == lower)
            .ok_or_else(|| {
                format!("unknown colour order '{s}' (expected rgb, rbg, grb, gbr, brg or bgr)")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_apa102_native() {
        let c = Rgb::new(1, 2, 3);
        assert_eq!(ColorOrder::default().arrange(c), [3, 2, 1]);
    }

    #[test]
    fn every_order_is_a_permutation() {
        let c = Rgb::new(10, 20, 30);
        for order in ColorOrder::ALL {
            let mut bytes = order.arrange(c);
            bytes.sort_unstable();
            assert_eq!(bytes, [10, 20, 30], "{order}");
        }
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("GRB".parse::<ColorOrder>().unwrap(), ColorOrder::Grb);
        assert_eq!("bgr".parse::<ColorOrder>().unwrap(), ColorOrder::Bgr);
        assert!("rgbw".parse::<ColorOrder>().is_err());
    }
}
