//! Statistic identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A numeric counter carried by every stat snapshot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Eliminations,
    FinalBlows,
    Deaths,
    Assists,
    HeroDamageDealt,
    DamageTaken,
    HealingDealt,
    HealingReceived,
    DamageBlocked,
    UltimatesEarned,
    UltimatesUsed,
    HeroTimePlayed,
    WeaponAccuracy,
}

impl Stat {
    pub const ALL: [Stat; 13] = [
        Stat::Eliminations,
        Stat::FinalBlows,
        Stat::Deaths,
        Stat::Assists,
        Stat::HeroDamageDealt,
        Stat::DamageTaken,
        Stat::HealingDealt,
        Stat::HealingReceived,
        Stat::DamageBlocked,
        Stat::UltimatesEarned,
        Stat::UltimatesUsed,
        Stat::HeroTimePlayed,
        Stat::WeaponAccuracy,
    ];

    /// Snake-case identifier, as used in storage and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Eliminations => "eliminations",
            Stat::FinalBlows => "final_blows",
            Stat::Deaths => "deaths",
            Stat::Assists => "assists",
            Stat::HeroDamageDealt => "hero_damage_dealt",
            Stat::DamageTaken => "damage_taken",
            Stat::HealingDealt => "healing_dealt",
            Stat::HealingReceived => "healing_received",
            Stat::DamageBlocked => "damage_blocked",
            Stat::UltimatesEarned => "ultimates_earned",
            Stat::UltimatesUsed => "ultimates_used",
            Stat::HeroTimePlayed => "hero_time_played",
            Stat::WeaponAccuracy => "weapon_accuracy",
        }
    }

    /// Whether a per-10-minutes rate of this stat is meaningful.
    ///
    /// Time played is the denominator itself and accuracy is already a ratio.
    pub fn is_rate(&self) -> bool {
        !matches!(self, Stat::HeroTimePlayed | Stat::WeaponAccuracy)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Stat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Stat::ALL
            .iter()
            .copied()
            .find(|stat| stat.as_str() == normalized)
            .ok_or_else(|| format!("Unknown statistic: {}", s))
    }
}
