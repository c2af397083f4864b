pub(crate) mod convert;
pub(crate) mod setup;
pub(crate) mod sheet;
