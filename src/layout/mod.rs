pub(crate) mod fit;
pub(crate) mod font;
pub(crate) mod resolver;
pub(crate) mod text;
