mod handler;
pub mod model;

pub use handler::{
    all_users,
    delete_user,
    find_user,
    get_invitation,
    get_me,
    get_user,
    patch_me,
    patch_user,
    submit_invitation,
};
pub use model::{User, UserInfo};
