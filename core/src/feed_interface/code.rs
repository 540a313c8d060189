use crate::prelude::WarnError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Warning categories tracked by the board, in display order.
///
/// The serialized form is the code used by the observatory `warnsum` feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WarningCode {
    #[serde(rename = "WHOT")]
    VeryHot,
    #[serde(rename = "WRAINA")]
    AmberRain,
    #[serde(rename = "WRAINR")]
    RedRain,
    #[serde(rename = "WRAINB")]
    BlackRain,
    #[serde(rename = "TC1")]
    Signal1,
    #[serde(rename = "TC3")]
    Signal3,
    #[serde(rename = "TC8NE")]
    Signal8NorthEast,
    #[serde(rename = "TC8SE")]
    Signal8SouthEast,
    #[serde(rename = "TC8NW")]
    Signal8NorthWest,
    #[serde(rename = "TC8SW")]
    Signal8SouthWest,
    #[serde(rename = "TC9")]
    Signal9,
    #[serde(rename = "TC10")]
    Signal10,
    #[serde(rename = "WTS")]
    Thunderstorm,
    #[serde(rename = "WFNTSA")]
    NorthernFlooding,
    #[serde(rename = "WL")]
    Landslip,
    #[serde(rename = "WCOLD")]
    Cold,
    #[serde(rename = "WMSGNL")]
    StrongMonsoon,
    #[serde(rename = "WFROST")]
    Frost,
    #[serde(rename = "WFIREY")]
    YellowFire,
    #[serde(rename = "WFIRER")]
    RedFire,
    #[serde(rename = "WTMW")]
    Tsunami,
}

impl WarningCode {
    pub const COUNT: usize = 21;

    pub const ALL: [WarningCode; Self::COUNT] = [
        WarningCode::VeryHot,
        WarningCode::AmberRain,
        WarningCode::RedRain,
        WarningCode::BlackRain,
        WarningCode::Signal1,
        WarningCode::Signal3,
        WarningCode::Signal8NorthEast,
        WarningCode::Signal8SouthEast,
        WarningCode::Signal8NorthWest,
        WarningCode::Signal8SouthWest,
        WarningCode::Signal9,
        WarningCode::Signal10,
        WarningCode::Thunderstorm,
        WarningCode::NorthernFlooding,
        WarningCode::Landslip,
        WarningCode::Cold,
        WarningCode::StrongMonsoon,
        WarningCode::Frost,
        WarningCode::YellowFire,
        WarningCode::RedFire,
        WarningCode::Tsunami,
    ];

    /// Dense position in `ALL`, used to index fixed-size tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Feed code, e.g. `TC8NE`.
    pub fn code(self) -> &'static str {
        match self {
            WarningCode::VeryHot => "WHOT",
            WarningCode::AmberRain => "WRAINA",
            WarningCode::RedRain => "WRAINR",
            WarningCode::BlackRain => "WRAINB",
            WarningCode::Signal1 => "TC1",
            WarningCode::Signal3 => "TC3",
            WarningCode::Signal8NorthEast => "TC8NE",
            WarningCode::Signal8SouthEast => "TC8SE",
            WarningCode::Signal8NorthWest => "TC8NW",
            WarningCode::Signal8SouthWest => "TC8SW",
            WarningCode::Signal9 => "TC9",
            WarningCode::Signal10 => "TC10",
            WarningCode::Thunderstorm => "WTS",
            WarningCode::NorthernFlooding => "WFNTSA",
            WarningCode::Landslip => "WL",
            WarningCode::Cold => "WCOLD",
            WarningCode::StrongMonsoon => "WMSGNL",
            WarningCode::Frost => "WFROST",
            WarningCode::YellowFire => "WFIREY",
            WarningCode::RedFire => "WFIRER",
            WarningCode::Tsunami => "WTMW",
        }
    }

    /// File stem shared by the icon and sound assets of this warning.
    pub fn asset_stem(self) -> &'static str {
        match self {
            WarningCode::VeryHot => "vhot",
            WarningCode::AmberRain => "raina",
            WarningCode::RedRain => "rainr",
            WarningCode::BlackRain => "rainb",
            WarningCode::Signal1 => "tc1",
            WarningCode::Signal3 => "tc3",
            WarningCode::Signal8NorthEast => "tc8ne",
            WarningCode::Signal8SouthEast => "tc8se",
            WarningCode::Signal8NorthWest => "tc8nw",
            WarningCode::Signal8SouthWest => "tc8sw",
            WarningCode::Signal9 => "tc9",
            WarningCode::Signal10 => "tc10",
            WarningCode::Thunderstorm => "ts",
            WarningCode::NorthernFlooding => "ntfl",
            WarningCode::Landslip => "landslip",
            WarningCode::Cold => "cold",
            WarningCode::StrongMonsoon => "msn",
            WarningCode::Frost => "frost",
            WarningCode::YellowFire => "firey",
            WarningCode::RedFire => "firer",
            WarningCode::Tsunami => "tsunami-warn",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|candidate| candidate.code() == code)
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for WarningCode {
    type Err = WarnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| WarnError::FeedParse(format!("untracked code {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (position, code) in WarningCode::ALL.iter().enumerate() {
            assert_eq!(code.index(), position);
        }
    }

    #[test]
    fn feed_codes_parse_back() {
        for code in WarningCode::ALL {
            assert_eq!(code.code().parse::<WarningCode>().unwrap(), code);
        }
        assert!("WFIRE".parse::<WarningCode>().is_err());
        assert!("CANCEL".parse::<WarningCode>().is_err());
    }

    #[test]
    fn serializes_as_feed_code() {
        let json = serde_json::to_string(&WarningCode::Signal8NorthEast).unwrap();
        assert_eq!(json, "\"TC8NE\"");
        let parsed: WarningCode = serde_json::from_str("\"WTMW\"").unwrap();
        assert_eq!(parsed, WarningCode::Tsunami);
    }

    #[test]
    fn asset_stems_follow_icon_names() {
        assert_eq!(WarningCode::VeryHot.asset_stem(), "vhot");
        assert_eq!(WarningCode::NorthernFlooding.asset_stem(), "ntfl");
        assert_eq!(WarningCode::Tsunami.asset_stem(), "tsunami-warn");
    }
}
