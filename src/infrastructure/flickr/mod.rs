//! Flickr photo search adapter.

pub mod client;
pub mod dto;
pub mod endpoints;

pub use client::FlickrPhotoSource;
pub use endpoints::{max_pages, photo_url, pick_page, search_url};
