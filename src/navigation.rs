pub(crate) mod crossfade;
pub(crate) mod state;
