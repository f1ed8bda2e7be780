//! Per-round player stat snapshots.

use serde::{Deserialize, Serialize};

use super::{Hero, MapId, RowFingerprint, Stat};

/// One telemetry record: a player's cumulative counters on one hero at a
/// point in the map.
///
/// Counters are cumulative since map start for this hero assignment, not
/// per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSnapshotRow {
    pub map_id: MapId,
    pub round_number: u32,
    /// Seconds since map start
    pub match_time: f64,
    pub player_name: String,
    pub player_team: String,
    pub player_hero: Hero,

    pub eliminations: f64,
    pub final_blows: f64,
    pub deaths: f64,
    pub assists: f64,
    pub hero_damage_dealt: f64,
    pub damage_taken: f64,
    pub healing_dealt: f64,
    pub healing_received: f64,
    pub damage_blocked: f64,
    pub ultimates_earned: f64,
    pub ultimates_used: f64,
    /// Seconds on this hero
    pub hero_time_played: f64,
    /// Percentage, 0..=100
    pub weapon_accuracy: f64,
}

impl StatSnapshotRow {
    /// Create a row with every counter at zero.
    pub fn new(
        map_id: MapId,
        round_number: u32,
        match_time: f64,
        player_name: impl Into<String>,
        player_team: impl Into<String>,
        player_hero: Hero,
    ) -> Self {
        Self {
            map_id,
            round_number,
            match_time,
            player_name: player_name.into(),
            player_team: player_team.into(),
            player_hero,
            eliminations: 0.0,
            final_blows: 0.0,
            deaths: 0.0,
            assists: 0.0,
            hero_damage_dealt: 0.0,
            damage_taken: 0.0,
            healing_dealt: 0.0,
            healing_received: 0.0,
            damage_blocked: 0.0,
            ultimates_earned: 0.0,
            ultimates_used: 0.0,
            hero_time_played: 0.0,
            weapon_accuracy: 0.0,
        }
    }

    /// Set one counter, builder style.
    pub fn with(mut self, stat: Stat, value: f64) -> Self {
        *self.value_mut(stat) = value;
        self
    }

    /// Read one counter.
    pub fn value(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Eliminations => self.eliminations,
            Stat::FinalBlows => self.final_blows,
            Stat::Deaths => self.deaths,
            Stat::Assists => self.assists,
            Stat::HeroDamageDealt => self.hero_damage_dealt,
            Stat::DamageTaken => self.damage_taken,
            Stat::HealingDealt => self.healing_dealt,
            Stat::HealingReceived => self.healing_received,
            Stat::DamageBlocked => self.damage_blocked,
            Stat::UltimatesEarned => self.ultimates_earned,
            Stat::UltimatesUsed => self.ultimates_used,
            Stat::HeroTimePlayed => self.hero_time_played,
            Stat::WeaponAccuracy => self.weapon_accuracy,
        }
    }

    fn value_mut(&mut self, stat: Stat) -> &mut f64 {
        match stat {
            Stat::Eliminations => &mut self.eliminations,
            Stat::FinalBlows => &mut self.final_blows,
            Stat::Deaths => &mut self.deaths,
            Stat::Assists => &mut self.assists,
            Stat::HeroDamageDealt => &mut self.hero_damage_dealt,
            Stat::DamageTaken => &mut self.damage_taken,
            Stat::HealingDealt => &mut self.healing_dealt,
            Stat::HealingReceived => &mut self.healing_received,
            Stat::DamageBlocked => &mut self.damage_blocked,
            Stat::UltimatesEarned => &mut self.ultimates_earned,
            Stat::UltimatesUsed => &mut self.ultimates_used,
            Stat::HeroTimePlayed => &mut self.hero_time_played,
            Stat::WeaponAccuracy => &mut self.weapon_accuracy,
        }
    }

    /// Fingerprint over every field of the row.
    ///
    /// Floats are hashed by bit pattern, so two rows share a fingerprint
    /// exactly when every field is identical.
    pub fn fingerprint(&self) -> RowFingerprint {
        let round = self.round_number.to_string();
        let time = hex::encode(self.match_time.to_bits().to_be_bytes());
        let counters: Vec<String> = Stat::ALL
            .iter()
            .map(|stat| hex::encode(self.value(*stat).to_bits().to_be_bytes()))
            .collect();

        let mut fields: Vec<&str> = vec![
            self.map_id.as_str(),
            round.as_str(),
            time.as_str(),
            self.player_name.as_str(),
            self.player_team.as_str(),
            self.player_hero.name(),
        ];
        fields.extend(counters.iter().map(String::as_str));
        RowFingerprint::fingerprint(&fields)
    }
}
