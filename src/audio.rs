pub(crate) mod gain;
pub(crate) mod offline;
pub(crate) mod surface;
pub(crate) mod transition;
