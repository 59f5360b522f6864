use std::alloc::Layout;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("allocation of {0:?} failed")]
    OutOfMemory(Layout),
    #[error("usage error: {0}")]
    Usage(&'static str),
}

pub type Result<T> = std::result::Result<T, CollectionError>;
