pub(crate) mod block;
pub(crate) mod frame;
pub(crate) mod manager;
pub(crate) mod options;
