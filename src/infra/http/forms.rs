//! Request extractors for HTML form submissions.

use axum::{
    Form,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use serde::Deserialize;

use crate::application::forms::{ImageUpload, PostForm};

const IMAGE_CLEAR_FIELD: &str = "image-clear";

/// A post form submitted either as `multipart/form-data` (with an optional
/// image) or as a plain urlencoded body. A request without a body yields an
/// empty form, which then fails validation like any blank submission.
#[derive(Debug, Default)]
pub struct PostFormInput(pub PostForm);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UrlencodedPostFields {
    text: String,
    group: Option<String>,
    #[serde(rename = "image-clear")]
    image_clear: Option<String>,
}

impl<S> FromRequest<S> for PostFormInput
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(request, state)
                .await
                .map_err(IntoResponse::into_response)?;
            read_multipart(multipart).await.map(Self)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<UrlencodedPostFields>::from_request(request, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(PostForm {
                text: fields.text,
                group: fields.group,
                image: None,
                clear_image: is_checked(fields.image_clear.as_deref()),
            }))
        } else {
            Ok(Self::default())
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<PostForm, Response> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(IntoResponse::into_response)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => {
                form.text = field.text().await.map_err(IntoResponse::into_response)?;
            }
            "group" => {
                form.group = Some(field.text().await.map_err(IntoResponse::into_response)?);
            }
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(IntoResponse::into_response)?;
                form.image = Some(ImageUpload { filename, bytes });
            }
            IMAGE_CLEAR_FIELD => {
                let value = field.text().await.map_err(IntoResponse::into_response)?;
                form.clear_image = is_checked(Some(&value));
            }
            _ => {}
        }
    }

    Ok(form)
}

fn is_checked(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some(v) if !v.is_empty() && v != "false" && v != "0")
}
