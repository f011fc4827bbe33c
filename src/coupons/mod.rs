pub mod model;
pub mod service;

pub use model::{
    ApplyCouponRequest, Coupon, CouponResponse, CouponUsage, CouponValidationResponse,
    CreateCouponRequest, ValidateCouponRequest,
};
pub use service::CouponService;
