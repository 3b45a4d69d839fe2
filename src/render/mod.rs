pub(crate) mod display_list;
pub(crate) mod frame;
pub(crate) mod surface;
