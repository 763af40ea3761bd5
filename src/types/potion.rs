//! Potion types and their canonical default durations.

use crate::error::ProtocolError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PotionType {
    #[default]
    None,
    Speed,
    Light,
    Swim,
    Energy,
    Regen,
    Health,
    Time,
    Lava,
    Shield,
    Haste,
    Escape,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Potion {
    pub kind: PotionType,
    pub duration: i32,
}

impl Potion {
    pub fn new(kind: PotionType, duration: i32) -> Potion {
        Potion { kind, duration }
    }

    /// A potion of `kind` with its canonical default duration.
    pub fn with_default_duration(kind: PotionType) -> Potion {
        Potion { kind, duration: default_duration(kind) }
    }
}

pub fn default_duration(kind: PotionType) -> i32 {
    use PotionType::*;
    match kind {
        None => 0,
        Speed => 70,
        Light => 100,
        Swim => 80,
        Energy => 140,
        Regen => 30,
        Health => 0,
        Time => 30,
        Lava => 120,
        Shield => 90,
        Haste => 80,
        Escape => 0,
    }
}

pub fn potion_name(kind: PotionType) -> &'static str {
    use PotionType::*;
    match kind {
        None => "None",
        Speed => "Speed",
        Light => "Light",
        Swim => "Swim",
        // The original source's name table carries a trailing space here
        // ("Energy "); that looks like a typo rather than a grammar rule,
        // so the clean name is used instead (see design notes).
        Energy => "Energy",
        Regen => "Regen",
        Health => "Health",
        Time => "Time",
        Lava => "Lava",
        Shield => "Shield",
        Haste => "Haste",
        Escape => "Escape",
    }
}

pub fn potion_type(name: &str) -> Result<PotionType, ProtocolError> {
    use PotionType::*;
    Ok(match name {
        "None" => None,
        "Speed" => Speed,
        "Light" => Light,
        "Swim" => Swim,
        "Energy" => Energy,
        "Regen" => Regen,
        "Health" => Health,
        "Time" => Time,
        "Lava" => Lava,
        "Shield" => Shield,
        "Haste" => Haste,
        "Escape" => Escape,
        other => {
            return Err(ProtocolError::Malformed { variant: "potion_type", raw: other.to_string() })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_match_catalog() {
        assert_eq!(default_duration(PotionType::Speed), 70);
        assert_eq!(default_duration(PotionType::Energy), 140);
        assert_eq!(default_duration(PotionType::Lava), 120);
        assert_eq!(default_duration(PotionType::Escape), 0);
    }

    #[test]
    fn name_round_trips() {
        for &kind in &[PotionType::None, PotionType::Speed, PotionType::Energy, PotionType::Escape] {
            assert_eq!(potion_type(potion_name(kind)).unwrap(), kind);
        }
    }

    #[test]
    fn energy_name_has_no_trailing_space() {
        assert_eq!(potion_name(PotionType::Energy), "Energy");
    }
}
