pub(crate) mod context;
pub(crate) mod entry;
pub(crate) mod rules;
