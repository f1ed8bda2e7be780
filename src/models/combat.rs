//! Kill, ultimate and round events, and the fights derived from them.

use serde::{Deserialize, Serialize};

use super::{EventFingerprint, Hero};

/// One side of a kill event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub hero: Hero,
    pub team: String,
}

impl Combatant {
    pub fn new(name: impl Into<String>, hero: Hero, team: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hero,
            team: team.into(),
        }
    }
}

/// A kill recorded during a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillEvent {
    /// Seconds since map start
    pub match_time: f64,
    pub round_number: u32,
    pub attacker: Combatant,
    pub victim: Combatant,
    pub event_ability: String,
}

impl KillEvent {
    pub fn new(match_time: f64, round_number: u32, attacker: Combatant, victim: Combatant) -> Self {
        Self {
            match_time,
            round_number,
            attacker,
            victim,
            event_ability: "Primary Fire".to_string(),
        }
    }

    /// Fingerprint over every field of the event, times by bit pattern.
    pub fn fingerprint(&self) -> EventFingerprint {
        let time = hex::encode(self.match_time.to_bits().to_be_bytes());
        let round = self.round_number.to_string();
        EventFingerprint::fingerprint(&[
            time.as_str(),
            round.as_str(),
            self.attacker.name.as_str(),
            self.attacker.hero.name(),
            self.attacker.team.as_str(),
            self.victim.name.as_str(),
            self.victim.hero.name(),
            self.victim.team.as_str(),
            self.event_ability.as_str(),
        ])
    }
}

/// A temporally clustered burst of kills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fight {
    /// Time of the first kill
    pub start: f64,
    /// Time of the last kill
    pub end: f64,
    pub kills: Vec<KillEvent>,
}

impl Fight {
    /// Open a fight with its first kill.
    pub fn open(first: KillEvent) -> Self {
        Self {
            start: first.match_time,
            end: first.match_time,
            kills: vec![first],
        }
    }

    /// Append a kill, extending the fight's end.
    pub fn push(&mut self, kill: KillEvent) {
        self.end = kill.match_time;
        self.kills.push(kill);
    }

    /// The kill that opened the fight. `None` only for a fight read back
    /// without kills.
    pub fn first_kill(&self) -> Option<&KillEvent> {
        self.kills.first()
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Kills landed by a team inside this fight.
    pub fn kills_by_team(&self, team: &str) -> usize {
        self.kills.iter().filter(|k| k.attacker.team == team).count()
    }

    /// Deaths suffered by a team inside this fight.
    pub fn deaths_of_team(&self, team: &str) -> usize {
        self.kills.iter().filter(|k| k.victim.team == team).count()
    }
}

/// Start and end of one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundBoundary {
    pub round_number: u32,
    pub start_time: f64,
    pub end_time: f64,
}

/// Phase of an ultimate ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UltimateEventKind {
    Charged,
    Start,
    End,
}

/// An ultimate charge/start/end event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UltimateEvent {
    pub match_time: f64,
    pub round_number: u32,
    pub player_name: String,
    pub player_hero: Hero,
    pub player_team: String,
    pub kind: UltimateEventKind,
}
