mod handler;
mod model;

pub use handler::{
    change_password,
    check_token,
    forgotten_password,
    login,
    logout,
    register,
    reset_password,
    verify_email,
};
