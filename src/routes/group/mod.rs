mod handler;
pub mod model;

pub use handler::{
    add_guest,
    all_groups,
    create_group,
    delete_group,
    find_by_registration_code,
    get_group,
    patch_group,
    relate_guest,
    remove_guest,
    unrelate_guest,
};
pub use model::{
    Guest,
    GroupDetail,
    Invitation,
    InvitationGroup,
    InvitationType,
    ResponseType,
};
