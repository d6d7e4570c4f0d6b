mod handler;
pub mod model;

pub use handler::{
    create_item,
    delete_item,
    get_all,
    get_item,
    update_guest_menu,
    update_item,
};
pub use model::{MenuCourse, MenuItem};
