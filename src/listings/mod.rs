pub mod model;
pub mod service;

pub use model::{
    ActivationReason, AdminListingQuery, AdminStatusRequest, BrowseQuery, CreateListingRequest,
    Favorite, FavoriteRequest, Listing, ListingResponse, UpdateListingRequest,
};
pub use service::{remove_image_files, ListingService, ListingViewer};
