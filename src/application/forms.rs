//! User-facing forms: field metadata and validation.
//!
//! Validation never fails the request. Errors are collected per field and the
//! form is re-rendered with the messages inline.

use bytes::Bytes;

use crate::domain::entities::{GroupRecord, USERNAME_MAX_LEN};

/// Presentation metadata for a single form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    pub required: bool,
}

pub const POST_TEXT: FieldSpec = FieldSpec {
    name: "text",
    label: "Text",
    help_text: "Write the text of your post here",
    required: true,
};

pub const POST_GROUP: FieldSpec = FieldSpec {
    name: "group",
    label: "Group",
    help_text: "Optionally pick the group this post belongs to",
    required: false,
};

pub const POST_IMAGE: FieldSpec = FieldSpec {
    name: "image",
    label: "Image",
    help_text: "Optionally attach a picture to the post",
    required: false,
};

pub const COMMENT_TEXT: FieldSpec = FieldSpec {
    name: "text",
    label: "Comment",
    help_text: "Write your comment here",
    required: true,
};

pub const POST_TEXT_REQUIRED: &str = "Post text must not be empty or consist only of whitespace.";
pub const COMMENT_TEXT_REQUIRED: &str =
    "Comment text must not be empty or consist only of whitespace.";
pub const INVALID_GROUP: &str = "Select a valid group.";
pub const EMPTY_IMAGE: &str = "The submitted file is empty.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const FIELD_REQUIRED: &str = "This field is required.";

/// Client filename extensions accepted for post images.
pub const IMAGE_EXTENSIONS: &[&str] = &["bmp", "gif", "jpeg", "jpg", "png", "webp"];

/// Validation messages keyed by field name, in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    entries: Vec<(&'static str, String)>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.entries.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_field(&self, field: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(name, _)| *name == field)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.entries.iter().any(|(name, _)| *name == field)
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// A file received through a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Both the client's extension and the sniffed format must be an image.
    fn validate(&self) -> Option<ValidImage> {
        let client_extension = std::path::Path::new(&self.filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        if let Some(ext) = &client_extension
            && !IMAGE_EXTENSIONS.contains(&ext.as_str())
        {
            return None;
        }

        imagesize::blob_size(&self.bytes).ok()?;
        let extension = match imagesize::image_type(&self.bytes).ok()? {
            imagesize::ImageType::Bmp => "bmp",
            imagesize::ImageType::Gif => "gif",
            imagesize::ImageType::Jpeg => "jpg",
            imagesize::ImageType::Png => "png",
            imagesize::ImageType::Webp => "webp",
            _ => return None,
        };

        Some(ValidImage {
            filename: self.filename.clone(),
            extension,
            bytes: self.bytes.clone(),
        })
    }
}

/// Raw post form input, as submitted.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<ImageUpload>,
    pub clear_image: bool,
}

/// An upload whose content decoded as a supported image format.
#[derive(Debug, Clone)]
pub struct ValidImage {
    pub filename: String,
    /// Extension of the detected format, never the client's.
    pub extension: &'static str,
    pub bytes: Bytes,
}

/// Post form input that passed validation.
#[derive(Debug, Clone)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<ValidImage>,
    pub clear_image: bool,
}

impl PostForm {
    /// Check the submission against the currently known groups.
    pub fn validate(&self, groups: &[GroupRecord]) -> Result<ValidPost, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add(POST_TEXT.name, POST_TEXT_REQUIRED);
        }

        let group_id = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                match raw
                    .parse::<i64>()
                    .ok()
                    .filter(|id| groups.iter().any(|group| group.id == *id))
                {
                    Some(id) => Some(id),
                    None => {
                        errors.add(POST_GROUP.name, INVALID_GROUP);
                        None
                    }
                }
            }
        };

        let image = match &self.image {
            Some(upload) if upload.filename.is_empty() && upload.bytes.is_empty() => None,
            Some(upload) if upload.bytes.is_empty() => {
                errors.add(POST_IMAGE.name, EMPTY_IMAGE);
                None
            }
            Some(upload) => match upload.validate() {
                Some(image) => Some(image),
                None => {
                    errors.add(POST_IMAGE.name, INVALID_IMAGE);
                    None
                }
            },
            None => None,
        };

        errors.into_result(ValidPost {
            text: text.to_string(),
            group_id,
            image,
            clear_image: self.clear_image,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        let text = self.text.trim();
        if text.is_empty() {
            errors.add(COMMENT_TEXT.name, COMMENT_TEXT_REQUIRED);
        }
        errors.into_result(text.to_string())
    }
}

pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Signup input that passed the stateless checks; username uniqueness is
/// verified against storage by the auth service.
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<ValidSignup, FormErrors> {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", FIELD_REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_LEN} characters."),
            );
        } else if !username.chars().all(is_username_char) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.is_empty() {
            errors.add("password1", FIELD_REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."
                ),
            );
        }
        if self.password2.is_empty() {
            errors.add("password2", FIELD_REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result(ValidSignup {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: self.password1.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

fn is_username_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_')
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
