pub(crate) mod delivery;
pub(crate) mod probe;
pub(crate) mod traits;
