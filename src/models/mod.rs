pub mod notification;

pub use notification::{
    now_micros, AppNotification, NewNotification, NotificationKind, NotificationPriority,
    NotificationStatus,
};
