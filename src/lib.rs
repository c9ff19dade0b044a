//---------------------------------------
pub mod error;
pub mod models;
pub mod route;
pub mod settings;
pub mod util;

pub use error::{ClientError, Disposition};
pub use route::Route;
pub use settings::Settings;
//---------------------------------------

//---------------------------------------
pub mod session;
pub mod http;

pub use session::{AuthState, Identity, IdentityProvider, Session, StaticIdentity};
pub use http::ApiClient;
//---------------------------------------

//---------------------------------------
pub mod services {
    pub mod project;
    pub mod member;
    pub mod task;
    pub mod comment;
    pub mod invitation;
    pub mod notification;
    pub mod user;
    pub mod dashboard;
}
//---------------------------------------

//---------------------------------------
pub mod stores {
    pub mod project;
    pub mod task_modal;
    pub mod comments;
    pub mod notifications;
    pub mod toast;
}

pub use stores::project::{LoadOutcome, ProjectStore};
pub use stores::task_modal::{ModalState, TaskEditor, TaskModal};
pub use stores::comments::CommentThread;
pub use stores::notifications::{NotificationCenter, NotificationFeed};
pub use stores::toast::{ToastKind, ToastQueue};
//---------------------------------------

//---------------------------------------
pub mod channel;
pub mod prefs;

pub use channel::{ChannelHandle, PushChannel};
pub use prefs::Prefs;
//---------------------------------------
