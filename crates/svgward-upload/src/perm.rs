//! Permission gate for SVG uploads

use async_trait::async_trait;

/// The authenticated party performing an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
	pub id_tag: Box<str>,
	pub roles: Box<[Box<str>]>,
}

impl Actor {
	pub fn new(id_tag: impl Into<Box<str>>, roles: &[&str]) -> Self {
		Self { id_tag: id_tag.into(), roles: roles.iter().map(|&r| r.into()).collect() }
	}

	pub fn has_role(&self, role: &str) -> bool {
		self.roles.iter().any(|r| r.as_ref() == role)
	}
}

#[async_trait]
pub trait UploadPermission: Send + Sync {
	/// Whether `actor` may upload SVG files at all.
	async fn user_can_upload(&self, actor: &Actor) -> bool;
}

/// Grants SVG uploads to actors holding any of the configured roles.
#[derive(Debug, Clone)]
pub struct RolePermission {
	roles: Vec<String>,
}

impl RolePermission {
	pub fn new<I, S>(roles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { roles: roles.into_iter().map(Into::into).collect() }
	}
}

#[async_trait]
impl UploadPermission for RolePermission {
	async fn user_can_upload(&self, actor: &Actor) -> bool {
		self.roles.iter().any(|role| actor.has_role(role))
	}
}


// vim: ts=4
