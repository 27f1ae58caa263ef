//! Towns a campaign can target

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CampaignError;

/// Town a campaign targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Town {
    Warsaw,
    Krakow,
    Lodz,
    Wroclaw,
    Poznan,
    Gdansk,
    Szczecin,
    Bydgoszcz,
    Lublin,
    Bialystok,
}

impl Town {
    /// All selectable towns
    pub const ALL: [Town; 10] = [
        Town::Warsaw,
        Town::Krakow,
        Town::Lodz,
        Town::Wroclaw,
        Town::Poznan,
        Town::Gdansk,
        Town::Szczecin,
        Town::Bydgoszcz,
        Town::Lublin,
        Town::Bialystok,
    ];

    /// Human-readable town name (with diacritics)
    pub fn display_name(&self) -> &'static str {
        match self {
            Town::Warsaw => "Warsaw",
            Town::Krakow => "Kraków",
            Town::Lodz => "Łódź",
            Town::Wroclaw => "Wrocław",
            Town::Poznan => "Poznań",
            Town::Gdansk => "Gdańsk",
            Town::Szczecin => "Szczecin",
            Town::Bydgoszcz => "Bydgoszcz",
            Town::Lublin => "Lublin",
            Town::Bialystok => "Białystok",
        }
    }
}

impl fmt::Display for Town {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Town {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WARSAW" => Ok(Town::Warsaw),
            "KRAKOW" => Ok(Town::Krakow),
            "LODZ" => Ok(Town::Lodz),
            "WROCLAW" => Ok(Town::Wroclaw),
            "POZNAN" => Ok(Town::Poznan),
            "GDANSK" => Ok(Town::Gdansk),
            "SZCZECIN" => Ok(Town::Szczecin),
            "BYDGOSZCZ" => Ok(Town::Bydgoszcz),
            "LUBLIN" => Ok(Town::Lublin),
            "BIALYSTOK" => Ok(Town::Bialystok),
            other => Err(CampaignError::invalid(format!("unknown town: {other}"))),
        }
    }
}
