//! AWS IAM datasource
//!
//! Serves users, groups, roles, policies, identity providers and the
//! membership/attachment entities between them. The crate ships no SDK
//! binding: embedders provide an [`IamClientFactory`] that builds
//! [`IamApi`] clients and [`RoleAssumer`]s for each request.
//!
//! [`RoleAssumer`]: crate::pagination::RoleAssumer

mod adapter;
mod listers;
mod types;

pub use adapter::{IamAdapter, DATASOURCE_TYPE};
pub use types::{
    access_key_credentials, IamApi, IamClientFactory, IamDatasourceConfig, IamEntity,
};

#[cfg(test)]
mod tests;
