mod friendship_service;
mod messaging_service;
mod post_service;
mod upload_service;
mod user_service;

pub use friendship_service::{
    AcceptedFriendship, FriendshipService, FriendshipServiceDependencies,
};
pub use messaging_service::{
    Conversation, MessagingService, MessagingServiceDependencies, SendMessageRequest,
};
pub use post_service::{CreatePostRequest, PostService, PostServiceDependencies};
pub use upload_service::{StoredFile, UploadService};
pub use user_service::{
    AuthenticateUserRequest, EditProfileRequest, RegisterUserRequest, UserService,
    UserServiceDependencies, SEARCH_LIMIT,
};
