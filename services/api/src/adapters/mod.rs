pub mod blob;
pub mod db;
pub mod identity;
pub mod mail;

pub use blob::LocalBlobStorage;
pub use db::PgDocumentStore;
pub use identity::DocumentIdentityService;
pub use mail::{LogMailer, SmtpMailer};
