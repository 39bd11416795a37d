pub(crate) mod blend;
pub(crate) mod software;
pub(crate) mod surface;
