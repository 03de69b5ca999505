pub(crate) mod admin;
pub(crate) mod locations;
pub(crate) mod map;
