//! Services for ratesvc
//!
//! - **Engagement**: star toggling and comment management
//! - **Avatar**: avatar URL derivation for comment authors
//! - **Clock**: injectable time and id sources

pub mod avatar;
pub mod clock;
pub mod engagement;

pub use avatar::avatar_url;
pub use clock::{Clock, FixedClock, IdGenerator, ObjectIdGenerator, SequentialIdGenerator, SystemClock};
pub use engagement::{
    AuthorView, CommentView, EngagementService, ItemView, StarOutcome, StarRequest, StarResult,
};
