use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    application::{
        error::{ErrorReport, HttpError},
        forms::{COMMENT_TEXT, FieldSpec, FormErrors, POST_GROUP, POST_IMAGE, POST_TEXT},
        pagination::Page,
        routes::{self, PostRoute},
    },
    domain::{
        entities::{CommentRecord, GroupRecord, PostRecord, UserRecord},
        text::{format_date, format_datetime},
    },
};

/// Pages shown on each side of the current page in the paginator.
const PAGINATOR_WINDOW: u64 = 2;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Render the HTML error page for `status`.
///
/// The error page is plain enough that a failure to render it falls back to
/// a bare status response.
pub fn render_error_page(chrome: LayoutChrome, status: StatusCode) -> Response {
    let content = ErrorPageView::for_status(status);
    let view = LayoutContext::new(chrome.with_title(content.title.clone()), content);
    render_template_response(ErrorTemplate { view }, status)
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let mut response = render_error_page(chrome, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct ViewerView {
    pub username: String,
    pub display_name: String,
    pub profile_href: String,
}

/// Site-wide page furniture: who is signed in, the page title, the footer year.
#[derive(Clone)]
pub struct LayoutChrome {
    pub viewer: Option<ViewerView>,
    pub title: String,
    pub year: i32,
}

impl LayoutChrome {
    pub fn new(viewer: Option<&UserRecord>) -> Self {
        Self {
            viewer: viewer.map(|user| ViewerView {
                username: user.username.clone(),
                display_name: display_name(&user.full_name(), &user.username),
                profile_href: routes::profile(&user.username),
            }),
            title: "Yatube".to_string(),
            year: OffsetDateTime::now_utc().year(),
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub viewer: Option<ViewerView>,
    pub title: String,
    pub year: i32,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            viewer: chrome.viewer,
            title: chrome.title,
            year: chrome.year,
            content,
        }
    }
}

#[derive(Clone)]
pub struct LinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PostCardView {
    pub id: i64,
    pub author_name: String,
    pub author_href: String,
    pub published: String,
    /// Text split on line breaks; the template joins them with `<br>`.
    pub lines: Vec<String>,
    pub group: Option<LinkView>,
    pub image_url: Option<String>,
    pub detail_href: String,
}

impl PostCardView {
    pub fn from_record(post: &PostRecord) -> Self {
        Self {
            id: post.id,
            author_name: post.author.display_name().to_string(),
            author_href: routes::profile(&post.author.username),
            published: format_date(post.pub_date),
            lines: split_lines(&post.text),
            group: post.group.as_ref().map(|group| LinkView {
                label: group.title.clone(),
                href: routes::group(&group.slug),
            }),
            image_url: post.image.as_deref().map(routes::media),
            detail_href: PostRoute::View.path(&post.author.username, post.id),
        }
    }
}

#[derive(Clone)]
pub struct PageLinkView {
    pub number: u64,
    pub href: String,
    pub current: bool,
}

#[derive(Clone)]
pub struct PaginatorView {
    pub number: u64,
    pub num_pages: u64,
    pub first: Option<String>,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub last: Option<String>,
    pub pages: Vec<PageLinkView>,
}

impl PaginatorView {
    pub fn from_page<T>(page: &Page<T>) -> Self {
        let href = |number: u64| format!("?page={number}");
        let start = page.number.saturating_sub(PAGINATOR_WINDOW).max(1);
        let end = (page.number + PAGINATOR_WINDOW).min(page.num_pages);

        Self {
            number: page.number,
            num_pages: page.num_pages,
            first: (page.number > 1).then(|| href(1)),
            previous: page.previous_number().map(href),
            next: page.next_number().map(href),
            last: (page.number < page.num_pages).then(|| href(page.num_pages)),
            pages: (start..=end)
                .map(|number| PageLinkView {
                    number,
                    href: href(number),
                    current: number == page.number,
                })
                .collect(),
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

#[derive(Clone)]
pub struct FeedView {
    pub cards: Vec<PostCardView>,
    pub paginator: PaginatorView,
}

impl FeedView {
    pub fn from_page(page: &Page<PostRecord>) -> Self {
        Self {
            cards: page.items.iter().map(PostCardView::from_record).collect(),
            paginator: PaginatorView::from_page(page),
        }
    }

    /// Lets the shared feed partial render every page that embeds a feed.
    pub fn feed(&self) -> &FeedView {
        self
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<FeedView>,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub view: LayoutContext<FeedView>,
}

#[derive(Clone)]
pub struct GroupView {
    pub title: String,
    pub description_lines: Vec<String>,
    pub feed: FeedView,
}

impl GroupView {
    pub fn new(group: &GroupRecord, page: &Page<PostRecord>) -> Self {
        Self {
            title: group.title.clone(),
            description_lines: split_lines(&group.description),
            feed: FeedView::from_page(page),
        }
    }

    pub fn feed(&self) -> &FeedView {
        &self.feed
    }
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub view: LayoutContext<GroupView>,
}

#[derive(Clone)]
pub struct FollowButtonView {
    pub href: String,
    pub label: &'static str,
    pub following: bool,
}

#[derive(Clone)]
pub struct ProfileView {
    pub username: String,
    pub display_name: String,
    pub post_count: u64,
    pub followers: u64,
    pub following: u64,
    pub follow_button: Option<FollowButtonView>,
    pub feed: FeedView,
}

impl ProfileView {
    pub fn feed(&self) -> &FeedView {
        &self.feed
    }
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub view: LayoutContext<ProfileView>,
}

#[derive(Clone)]
pub struct CommentView {
    pub author_name: String,
    pub author_href: String,
    pub created: String,
    pub lines: Vec<String>,
}

impl CommentView {
    pub fn from_record(comment: &CommentRecord) -> Self {
        Self {
            author_name: comment.author.display_name().to_string(),
            author_href: routes::profile(&comment.author.username),
            created: format_datetime(comment.created),
            lines: split_lines(&comment.text),
        }
    }
}

#[derive(Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    pub required: bool,
    pub errors: Vec<String>,
}

impl FieldView {
    pub fn new(spec: FieldSpec, errors: &FormErrors) -> Self {
        Self {
            name: spec.name,
            label: spec.label,
            help_text: spec.help_text,
            required: spec.required,
            errors: errors.for_field(spec.name),
        }
    }
}

#[derive(Clone)]
pub struct CommentFormView {
    pub action: String,
    pub field: FieldView,
    pub text: String,
}

impl CommentFormView {
    pub fn new(post: &PostRecord, text: &str, errors: &FormErrors) -> Self {
        Self {
            action: PostRoute::Comment.path(&post.author.username, post.id),
            field: FieldView::new(COMMENT_TEXT, errors),
            text: text.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct PostDetailView {
    pub card: PostCardView,
    pub author_post_count: u64,
    pub edit_href: Option<String>,
    pub comments: Vec<CommentView>,
    pub comment_form: Option<CommentFormView>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailView>,
}

#[derive(Clone)]
pub struct GroupOptionView {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

#[derive(Clone)]
pub struct PostFormView {
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub text_field: FieldView,
    pub group_field: FieldView,
    pub image_field: FieldView,
    pub groups: Vec<GroupOptionView>,
    pub current_image: Option<String>,
    pub non_field_errors: Vec<String>,
}

impl PostFormView {
    /// Form state for a submission (or an empty form when `selected_group`
    /// and `text` are blank).
    pub fn new(
        action: String,
        existing: Option<&PostRecord>,
        text: &str,
        selected_group: Option<&str>,
        groups: &[GroupRecord],
        errors: &FormErrors,
    ) -> Self {
        let selected = selected_group.and_then(|raw| raw.trim().parse::<i64>().ok());
        Self {
            is_edit: existing.is_some(),
            action,
            text: text.to_string(),
            text_field: FieldView::new(POST_TEXT, errors),
            group_field: FieldView::new(POST_GROUP, errors),
            image_field: FieldView::new(POST_IMAGE, errors),
            groups: groups
                .iter()
                .map(|group| GroupOptionView {
                    id: group.id,
                    title: group.title.clone(),
                    selected: Some(group.id) == selected,
                })
                .collect(),
            current_image: existing
                .and_then(|post| post.image.as_deref())
                .map(routes::media),
            non_field_errors: Vec::new(),
        }
    }

    /// Blank form for a new post, or a form pre-filled from `post`.
    pub fn initial(action: String, post: Option<&PostRecord>, groups: &[GroupRecord]) -> Self {
        let text = post.map(|post| post.text.as_str()).unwrap_or("");
        let group = post
            .and_then(|post| post.group.as_ref())
            .map(|group| group.id.to_string());
        Self::new(
            action,
            post,
            text,
            group.as_deref(),
            groups,
            &FormErrors::default(),
        )
    }
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormView>,
}

#[derive(Clone)]
pub struct SignupView {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub errors: FormErrors,
}

impl SignupView {
    pub fn field_errors(&self, field: &str) -> Vec<String> {
        self.errors.for_field(field)
    }
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub view: LayoutContext<SignupView>,
}

#[derive(Clone)]
pub struct LoginView {
    pub username: String,
    pub next: Option<String>,
    pub error: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginView>,
}

#[derive(Template)]
#[template(path = "logged_out.html")]
pub struct LoggedOutTemplate {
    pub view: LayoutContext<()>,
}

#[derive(Clone)]
pub struct AboutView {
    pub heading: &'static str,
    pub paragraphs: &'static [&'static str],
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub view: LayoutContext<AboutView>,
}

pub struct ErrorPageView {
    pub status_code: u16,
    pub title: String,
    pub message: String,
    pub action: LinkView,
}

impl ErrorPageView {
    pub fn for_status(status: StatusCode) -> Self {
        let (title, message) = match status {
            StatusCode::NOT_FOUND => (
                "Page not found",
                "The page you are looking for does not exist or has moved.",
            ),
            StatusCode::FORBIDDEN => ("Access denied", "You are not allowed to view this page."),
            _ => (
                "Something went wrong",
                "The server hit an error while handling this request. Please try again later.",
            ),
        };
        Self {
            status_code: status.as_u16(),
            title: title.to_string(),
            message: message.to_string(),
            action: LinkView {
                label: "Back to the front page".to_string(),
                href: routes::INDEX.to_string(),
            },
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

fn display_name(full_name: &str, username: &str) -> String {
    if full_name.trim().is_empty() {
        username.to_string()
    } else {
        full_name.to_string()
    }
}
