//! HTTP routes for ratesvc

pub mod comments;
pub mod health;
pub mod response;
pub mod stars;

pub use comments::{
    handle_create_comment, handle_delete_comment, handle_list_comments, parse_comment_path,
    CommentPath,
};
pub use health::{liveness_check, readiness_check, version_info};
pub use response::{data_response, error_response, json_response, ErrorResponse, FullBody};
pub use stars::{handle_list_stars, handle_update_star};
