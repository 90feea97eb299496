pub(crate) mod composer;
pub(crate) mod raster;
pub(crate) mod surface;
