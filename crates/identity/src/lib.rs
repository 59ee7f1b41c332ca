mod authz;
mod init_data;
pub mod repository;
mod token;

pub use authz::{AccessResolver, Action, ResourceScope};
pub use init_data::{InitData, sign_init_data, verify_init_data};
pub use token::{Claims, TokenIdentity, issue_access_token, verify_access_token};
