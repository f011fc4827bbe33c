pub mod model;
pub mod service;

pub use model::{
    CreateInspectionRequest, CreateOfferRequest, InspectionRequest, InspectionResponse,
    InspectionStatus, Offer, OfferResponse, OfferStatus, UpdateInspectionStatusRequest,
    UpdateOfferStatusRequest,
};
pub use service::OfferService;
