mod compiler;

pub use compiler::{
    assemble, assemble_with, error_document, escape_html, sandbox_frame, DocumentOptions,
    REACT_DOM_UMD, REACT_UMD,
};

#[cfg(test)]
mod tests;
