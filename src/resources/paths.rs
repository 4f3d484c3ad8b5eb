//! Backend REST resource paths

pub const LOGIN: &str = "/login";
pub const STUDENT: &str = "/student";
pub const TEACHER: &str = "/teacher";
pub const CLASSROOM: &str = "/classroom";
pub const ACTIVITY: &str = "/activity";
pub const ACTIVITY_TEMPLATE: &str = "/activity-template";
pub const MATERIAL_TEMPLATE: &str = "/material-template";
pub const MATERIAL_ASSIGNMENT: &str = "/material-assignment";
pub const NOTIFICATION: &str = "/notification";
pub const NOTIFICATION_MARK_AS_READ: &str = "/notification/mark-as-read";

/// Every resource a session may talk to
pub const ALL: [&str; 10] = [
    LOGIN,
    STUDENT,
    TEACHER,
    CLASSROOM,
    ACTIVITY,
    ACTIVITY_TEMPLATE,
    MATERIAL_TEMPLATE,
    MATERIAL_ASSIGNMENT,
    NOTIFICATION,
    NOTIFICATION_MARK_AS_READ,
];
