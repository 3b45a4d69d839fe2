pub(crate) mod job;
pub(crate) mod layers;
pub(crate) mod manifest;
