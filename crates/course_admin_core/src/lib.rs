pub mod courses;
pub mod domain;
pub mod locks;
pub mod memory;
pub mod notifications;
pub mod ports;
pub mod projects;
pub mod reconciler;
pub mod records;
pub mod result;
pub mod store;
pub mod users;

pub use courses::{CourseService, CreatedCourse};
pub use domain::{
    CourseDraft, CourseOption, CourseStatus, CourseTree, DraftId, ModuleDraft, NewUser,
    SectionDraft, User, Video,
};
pub use memory::InMemoryDocumentStore;
pub use ports::{
    Account, BlobStorage, DocumentStore, IdentityService, MailMessage, MailTransport, PortError,
    PortResult,
};
pub use projects::ProjectService;
pub use reconciler::{CourseReconciler, ReconcileError, ReconcileSummary};
pub use result::{FailureKind, OperationResult};
pub use users::{CreatedUser, UserService};
