use std::collections::HashMap;
use std::sync::LazyLock;

// Re-export the Species enum from the schema crate
pub use schema::Species;

use crate::errors::{SpeciesDataError, SpeciesDataResult};
use schema::{AbilityId, PokemonType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseStats {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub sp_attack: u8,
    pub sp_defense: u8,
    pub speed: u8,
}

impl BaseStats {
    pub fn as_array(&self) -> [u8; 6] {
        [
            self.hp,
            self.attack,
            self.defense,
            self.sp_attack,
            self.sp_defense,
            self.speed,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesData {
    pub name: &'static str,
    pub types: Vec<PokemonType>,
    pub base_stats: BaseStats,
    pub ability: AbilityId,
}

fn entry(
    name: &'static str,
    types: &[PokemonType],
    stats: [u8; 6],
    ability: AbilityId,
) -> SpeciesData {
    let [hp, attack, defense, sp_attack, sp_defense, speed] = stats;
    SpeciesData {
        name,
        types: types.to_vec(),
        base_stats: BaseStats {
            hp,
            attack,
            defense,
            sp_attack,
            sp_defense,
            speed,
        },
        ability,
    }
}

static SPECIES_DATA: LazyLock<HashMap<Species, SpeciesData>> = LazyLock::new(|| {
    use AbilityId as A;
    use PokemonType::*;
    use Species as S;

    HashMap::from([
        (S::Bulbasaur, entry("Bulbasaur", &[Grass, Poison], [45, 49, 49, 65, 65, 45], A::Chlorophyll)),
        (S::Charizard, entry("Charizard", &[Fire, Flying], [78, 84, 78, 109, 85, 100], A::None)),
        (S::Blastoise, entry("Blastoise", &[Water], [79, 83, 100, 85, 105, 78], A::None)),
        (S::Pidgeot, entry("Pidgeot", &[Normal, Flying], [83, 80, 75, 70, 70, 101], A::None)),
        (S::Rattata, entry("Rattata", &[Normal], [30, 56, 35, 25, 35, 72], A::RunAway)),
        (S::Pikachu, entry("Pikachu", &[Electric], [35, 55, 40, 50, 50, 90], A::Static)),
        (S::Clefairy, entry("Clefairy", &[Fairy], [70, 45, 48, 60, 65, 35], A::None)),
        (S::Dugtrio, entry("Dugtrio", &[Ground], [35, 100, 50, 50, 70, 120], A::None)),
        (S::Abra, entry("Abra", &[Psychic], [25, 20, 15, 105, 55, 90], A::None)),
        (S::Slowbro, entry("Slowbro", &[Water, Psychic], [95, 75, 110, 100, 80, 30], A::Regenerator)),
        (S::Gengar, entry("Gengar", &[Ghost, Poison], [60, 65, 60, 130, 75, 110], A::Levitate)),
        (S::Weezing, entry("Weezing", &[Poison], [65, 90, 120, 85, 70, 60], A::NeutralizingGas)),
        (S::Chansey, entry("Chansey", &[Normal], [250, 5, 5, 35, 105, 50], A::NaturalCure)),
        (S::Magikarp, entry("Magikarp", &[Water], [20, 10, 55, 15, 20, 80], A::SwiftSwim)),
        (S::Gyarados, entry("Gyarados", &[Water, Flying], [95, 125, 79, 60, 100, 81], A::Intimidate)),
        (S::Eevee, entry("Eevee", &[Normal], [55, 55, 50, 45, 65, 55], A::RunAway)),
        (S::Snorlax, entry("Snorlax", &[Normal], [160, 110, 65, 65, 110, 30], A::None)),
        (S::Mew, entry("Mew", &[Psychic], [100, 100, 100, 100, 100, 100], A::None)),
        (S::Skarmory, entry("Skarmory", &[Steel, Flying], [65, 80, 140, 40, 70, 70], A::None)),
        (S::Shuckle, entry("Shuckle", &[Bug, Rock], [20, 10, 230, 10, 230, 5], A::None)),
        (S::Blissey, entry("Blissey", &[Normal], [255, 10, 10, 75, 135, 55], A::NaturalCure)),
        (S::Ninjask, entry("Ninjask", &[Bug, Flying], [61, 90, 45, 50, 50, 160], A::SpeedBoost)),
        (S::Sableye, entry("Sableye", &[Dark, Ghost], [50, 75, 75, 65, 65, 50], A::Prankster)),
        (S::Feebas, entry("Feebas", &[Water], [20, 15, 20, 10, 55, 80], A::SwiftSwim)),
        (S::Garchomp, entry("Garchomp", &[Dragon, Ground], [108, 130, 95, 80, 85, 102], A::RoughSkin)),
        (S::Togekiss, entry("Togekiss", &[Fairy, Flying], [85, 50, 95, 120, 115, 80], A::None)),
        (S::Excadrill, entry("Excadrill", &[Ground, Steel], [110, 135, 60, 50, 65, 88], A::MoldBreaker)),
        (S::Greninja, entry("Greninja", &[Water, Dark], [72, 95, 67, 103, 71, 122], A::Protean)),
        (S::Oricorio, entry("Oricorio", &[Fire, Flying], [75, 70, 70, 98, 70, 93], A::Dancer)),
        (S::Regieleki, entry("Regieleki", &[Electric], [80, 100, 50, 100, 50, 200], A::None)),
        (S::Cyclizar, entry("Cyclizar", &[Dragon, Normal], [70, 95, 65, 85, 65, 121], A::None)),
    ])
});

/// Look up the read-only species entry.
pub fn get_species_data(species: Species) -> SpeciesDataResult<&'static SpeciesData> {
    SPECIES_DATA
        .get(&species)
        .ok_or(SpeciesDataError::SpeciesNotFound(species))
}

/// Display name for a species, falling back to its identifier.
pub fn species_name(species: Species) -> String {
    get_species_data(species)
        .map(|data| data.name.to_string())
        .unwrap_or_else(|_| species.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_species_has_data() {
        for species in Species::iter() {
            let data = get_species_data(species).expect("species table entry");
            assert!(!data.types.is_empty(), "{:?} has no types", species);
            assert!(data.base_stats.hp > 0);
        }
    }
}
