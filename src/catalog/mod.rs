//! Cached catalog reads for page rendering.

mod model;
mod service;

pub use model::{
    Book, Collection, CollectionWithBooks, Grade, Hadith, NavigationCollection, User,
};
pub use service::{CatalogBackend, CatalogService};
