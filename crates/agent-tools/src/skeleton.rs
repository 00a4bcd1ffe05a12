use std::path::Path;

use syn::visit_mut::VisitMut;
use syn::{ImplItemFn, ItemFn, TraitItemFn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkeletonError {
    #[error("Rust parse error: {0}")]
    Parse(#[from] syn::Error),

    #[error("Unsupported file type for skeleton view: {0}")]
    Unsupported(String),
}

/// Empties every function body; items nested in bodies go with them.
struct BodyStripper;

impl VisitMut for BodyStripper {
    fn visit_item_fn_mut(&mut self, item: &mut ItemFn) {
        item.block.stmts.clear();
    }

    fn visit_impl_item_fn_mut(&mut self, item: &mut ImplItemFn) {
        item.block.stmts.clear();
    }

    fn visit_trait_item_fn_mut(&mut self, item: &mut TraitItemFn) {
        if let Some(block) = &mut item.default {
            block.stmts.clear();
        }
    }
}

/// Declarations of a Rust source file with function bodies emptied.
pub fn rust_skeleton(source: &str) -> Result<String, SkeletonError> {
    let mut file = syn::parse_file(source)?;
    BodyStripper.visit_file_mut(&mut file);
    Ok(prettyplease::unparse(&file))
}

/// Picks a skeleton generator by file extension.
pub fn skeleton_for(path: &str, content: &str) -> Result<String, SkeletonError> {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("rs") => rust_skeleton(content),
        _ => Err(SkeletonError::Unsupported(path.to_string())),
    }
}
