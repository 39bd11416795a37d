pub(crate) mod fit;
pub(crate) mod hotspots;
