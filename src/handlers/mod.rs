pub mod characters;
pub mod lookups;
pub mod member;
pub mod sessions;

// Re-export handler functions for use in the dispatcher
pub use characters::list as characters_list;
pub use lookups::list as lookup_list;
pub use member::delete as member_delete;
pub use member::get as member_get;
pub use member::list as member_list;
pub use member::post as member_post;
pub use member::put as member_put;
pub use member::put_image as member_put_image;
pub use sessions::count as sessions_count;
pub use sessions::list as sessions_list;
