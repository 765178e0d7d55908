pub mod short_link;
pub mod url_status;

pub use short_link::Entity as ShortLinkEntity;
pub use url_status::Entity as UrlStatusEntity;
