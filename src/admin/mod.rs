pub mod model;
pub mod permissions;
pub mod service;

pub use model::{
    Admin, AdminLoginRequest, AdminLoginResponse, AdminResponse, CreateAdminRequest,
    SetAccountActiveRequest,
};
pub use permissions::{AdminRole, Capability, PermissionSet, ALL_CAPABILITIES};
pub use service::AdminService;
