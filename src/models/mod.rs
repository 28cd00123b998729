pub mod blog;
pub mod blog_image;
pub mod blog_tag;
pub mod comment;
pub mod favorite;
pub mod follow;
pub mod like;
pub mod password_reset_token;
pub mod profile;
pub mod tag;
pub mod user;
pub mod verification_token;

pub use blog::{Entity as Blog, Model as BlogModel, Visibility};
pub use blog_image::{Entity as BlogImage, Model as BlogImageModel};
pub use blog_tag::Entity as BlogTag;
pub use comment::{Entity as Comment, Model as CommentModel};
pub use favorite::Entity as Favorite;
pub use follow::Entity as Follow;
pub use like::Entity as Like;
pub use password_reset_token::Entity as PasswordResetToken;
pub use profile::{Entity as Profile, Model as ProfileModel};
pub use tag::{Entity as Tag, Model as TagModel};
pub use user::{Entity as User, Model as UserModel};
pub use verification_token::Entity as VerificationToken;
