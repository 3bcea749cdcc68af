//! Mortgage/HELOC parameter sets and profile loading

mod data;
pub mod loader;

pub use data::{HelocParams, MortgageParams};
pub use loader::{
    load_default_profiles, load_profiles, load_profiles_from_reader, Profile,
    DEFAULT_PROFILES_PATH,
};
