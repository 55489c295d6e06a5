mod error;
mod operations;
mod requests;
mod responses;
mod types;

pub use error::ValidationError;
pub use operations::{
    derive_tag, dwelling_years, generate_short_id, generate_user_id, is_reserved_email,
    is_reserved_username, page_window, require, validate_email, validate_living_since,
    validate_password, DEFAULT_USER_PAGE_SIZE, RESERVED_EMAIL, RESERVED_USERNAMES,
};
pub use requests::{
    CreateAnswerRequest, CreatePostRequest, CreateQuestionRequest, DeletePostRequest,
    LikePostRequest, ListPostsQuery, ListUsersQuery, LoginRequest, OtpRequest, PostLocator,
    ResetPasswordRequest, SignupRequest, UpdatePostRequest, UpdateProfileRequest,
};
pub use responses::{AnswerView, PostView, QuestionView, UserProfile};
pub use types::{
    Answer, LikeStatus, LivingSince, Notification, OtpRecord, Post, PostCategory, Question, Tag,
    User,
};
