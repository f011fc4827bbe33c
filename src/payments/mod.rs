pub mod model;
pub mod service;

pub use model::{
    AdminPaymentQuery, Payment, PaymentResponse, PaymentStatus, PublicationStatusResponse,
    SubmitPaymentRequest,
};
pub use service::PaymentService;
