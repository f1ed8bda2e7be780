//! Hero roster and role lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hero role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tank,
    Damage,
    Support,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Tank => write!(f, "tank"),
            Role::Damage => write!(f, "damage"),
            Role::Support => write!(f, "support"),
        }
    }
}

/// A playable hero.
///
/// Serialized as the in-game display name (`"Soldier: 76"`, `"Lúcio"`).
/// Parsing is lenient about case, punctuation and diacritics, but an
/// unrecognized name is always an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Hero {
    // Tank
    DVa,
    Doomfist,
    Hazard,
    JunkerQueen,
    Mauga,
    Orisa,
    Ramattra,
    Reinhardt,
    Roadhog,
    Sigma,
    Winston,
    WreckingBall,
    Zarya,
    // Damage
    Ashe,
    Bastion,
    Cassidy,
    Echo,
    Genji,
    Hanzo,
    Junkrat,
    Mei,
    Pharah,
    Reaper,
    Sojourn,
    Soldier76,
    Sombra,
    Symmetra,
    Torbjorn,
    Tracer,
    Venture,
    Widowmaker,
    // Support
    Ana,
    Baptiste,
    Brigitte,
    Illari,
    Juno,
    Kiriko,
    Lifeweaver,
    Lucio,
    Mercy,
    Moira,
    Zenyatta,
}

impl Hero {
    /// Every hero, in roster order.
    pub const ALL: [Hero; 42] = [
        Hero::DVa,
        Hero::Doomfist,
        Hero::Hazard,
        Hero::JunkerQueen,
        Hero::Mauga,
        Hero::Orisa,
        Hero::Ramattra,
        Hero::Reinhardt,
        Hero::Roadhog,
        Hero::Sigma,
        Hero::Winston,
        Hero::WreckingBall,
        Hero::Zarya,
        Hero::Ashe,
        Hero::Bastion,
        Hero::Cassidy,
        Hero::Echo,
        Hero::Genji,
        Hero::Hanzo,
        Hero::Junkrat,
        Hero::Mei,
        Hero::Pharah,
        Hero::Reaper,
        Hero::Sojourn,
        Hero::Soldier76,
        Hero::Sombra,
        Hero::Symmetra,
        Hero::Torbjorn,
        Hero::Tracer,
        Hero::Venture,
        Hero::Widowmaker,
        Hero::Ana,
        Hero::Baptiste,
        Hero::Brigitte,
        Hero::Illari,
        Hero::Juno,
        Hero::Kiriko,
        Hero::Lifeweaver,
        Hero::Lucio,
        Hero::Mercy,
        Hero::Moira,
        Hero::Zenyatta,
    ];

    /// Role of this hero.
    pub fn role(&self) -> Role {
        use Hero::*;
        match self {
            DVa | Doomfist | Hazard | JunkerQueen | Mauga | Orisa | Ramattra | Reinhardt
            | Roadhog | Sigma | Winston | WreckingBall | Zarya => Role::Tank,
            Ashe | Bastion | Cassidy | Echo | Genji | Hanzo | Junkrat | Mei | Pharah | Reaper
            | Sojourn | Soldier76 | Sombra | Symmetra | Torbjorn | Tracer | Venture
            | Widowmaker => Role::Damage,
            Ana | Baptiste | Brigitte | Illari | Juno | Kiriko | Lifeweaver | Lucio | Mercy
            | Moira | Zenyatta => Role::Support,
        }
    }

    /// In-game display name.
    pub fn name(&self) -> &'static str {
        use Hero::*;
        match self {
            DVa => "D.Va",
            Doomfist => "Doomfist",
            Hazard => "Hazard",
            JunkerQueen => "Junker Queen",
            Mauga => "Mauga",
            Orisa => "Orisa",
            Ramattra => "Ramattra",
            Reinhardt => "Reinhardt",
            Roadhog => "Roadhog",
            Sigma => "Sigma",
            Winston => "Winston",
            WreckingBall => "Wrecking Ball",
            Zarya => "Zarya",
            Ashe => "Ashe",
            Bastion => "Bastion",
            Cassidy => "Cassidy",
            Echo => "Echo",
            Genji => "Genji",
            Hanzo => "Hanzo",
            Junkrat => "Junkrat",
            Mei => "Mei",
            Pharah => "Pharah",
            Reaper => "Reaper",
            Sojourn => "Sojourn",
            Soldier76 => "Soldier: 76",
            Sombra => "Sombra",
            Symmetra => "Symmetra",
            Torbjorn => "Torbjörn",
            Tracer => "Tracer",
            Venture => "Venture",
            Widowmaker => "Widowmaker",
            Ana => "Ana",
            Baptiste => "Baptiste",
            Brigitte => "Brigitte",
            Illari => "Illari",
            Juno => "Juno",
            Kiriko => "Kiriko",
            Lifeweaver => "Lifeweaver",
            Lucio => "Lúcio",
            Mercy => "Mercy",
            Moira => "Moira",
            Zenyatta => "Zenyatta",
        }
    }
}

/// Lowercase ASCII key used to match hero names from logs.
fn lookup_key(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'ú' | 'Ú' => 'u',
            'ö' | 'Ö' => 'o',
            other => other,
        })
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Error returned when a hero name is not part of the roster.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown hero: {0}")]
pub struct UnknownHero(pub String);

impl FromStr for Hero {
    type Err = UnknownHero;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = lookup_key(s);
        if key.is_empty() {
            return Err(UnknownHero(s.to_string()));
        }
        Hero::ALL
            .iter()
            .copied()
            .find(|hero| lookup_key(hero.name()) == key)
            .ok_or_else(|| UnknownHero(s.to_string()))
    }
}

impl TryFrom<String> for Hero {
    type Error = UnknownHero;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hero> for String {
    fn from(hero: Hero) -> Self {
        hero.name().to_string()
    }
}

impl fmt::Display for Hero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_roles() {
        assert_eq!(Hero::Reinhardt.role(), Role::Tank);
        assert_eq!(Hero::Tracer.role(), Role::Damage);
        assert_eq!(Hero::Mercy.role(), Role::Support);
        assert_eq!(Hero::DVa.role(), Role::Tank);
    }

    #[test]
    fn test_every_name_round_trips_through_parse() {
        for hero in Hero::ALL {
            assert_eq!(hero.name().parse::<Hero>().unwrap(), hero);
        }
    }

    #[test]
    fn test_parse_is_lenient_about_formatting() {
        assert_eq!("lucio".parse::<Hero>().unwrap(), Hero::Lucio);
        assert_eq!("Soldier76".parse::<Hero>().unwrap(), Hero::Soldier76);
        assert_eq!("DVA".parse::<Hero>().unwrap(), Hero::DVa);
        assert_eq!("torbjorn".parse::<Hero>().unwrap(), Hero::Torbjorn);
        assert_eq!("wrecking_ball".parse::<Hero>().unwrap(), Hero::WreckingBall);
    }

    #[test]
    fn test_parse_unknown_hero() {
        assert_eq!(
            "Bob".parse::<Hero>(),
            Err(UnknownHero("Bob".to_string()))
        );
        assert!("".parse::<Hero>().is_err());
    }

    #[test]
    fn test_hero_serialization() {
        let json = serde_json::to_string(&Hero::Lucio).unwrap();
        assert_eq!(json, "\"Lúcio\"");

        let hero: Hero = serde_json::from_str("\"Soldier: 76\"").unwrap();
        assert_eq!(hero, Hero::Soldier76);

        let bad: Result<Hero, _> = serde_json::from_str("\"Not A Hero\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(format!("{}", Role::Support), "support");
        assert_eq!(serde_json::to_string(&Role::Tank).unwrap(), "\"tank\"");
    }
}
