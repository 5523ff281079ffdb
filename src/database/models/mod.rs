pub mod lookup;
pub mod member;
pub mod session;

pub use lookup::{resolve_names, LookupEntity};
pub use member::{Member, MemberPatch, MemberSummary, NewMember, SUMMARY_ATTRIBUTES};
pub use session::Session;
