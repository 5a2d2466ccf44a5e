use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, FromRepr};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter, FromRepr,
)]
#[repr(u16)]
pub enum Species {
    Bulbasaur = 1,
    Charizard = 6,
    Blastoise = 9,
    Pidgeot = 18,
    Rattata = 19,
    Pikachu = 25,
    Clefairy = 35,
    Dugtrio = 51,
    Abra = 63,
    Slowbro = 80,
    Gengar = 94,
    Weezing = 110,
    Chansey = 113,
    Magikarp = 129,
    Gyarados = 130,
    Eevee = 133,
    Snorlax = 143,
    Mew = 151,
    Skarmory = 227,
    Shuckle = 213,
    Blissey = 242,
    Ninjask = 291,
    Sableye = 302,
    Feebas = 349,
    Garchomp = 445,
    Togekiss = 468,
    Excadrill = 530,
    Greninja = 658,
    Oricorio = 741,
    Regieleki = 894,
    Cyclizar = 967,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
