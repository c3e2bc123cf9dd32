mod char_ref;
mod parser;
mod renderer;
mod tag;

pub(crate) use parser::parse;
pub(crate) use renderer::render;
