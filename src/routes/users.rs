use crate::config::Config;
use crate::helper::form_helpers;
use crate::helper::user_helpers::{self, UserHelperError};
use crate::models::forms::{FormErrors, RegistrationForm, UpdateUserForm};
use crate::models::Notification;
use crate::DbPool;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tera::{Context, Tera};

const LISTING_URL: &str = "/user_maintenance";

#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

pub fn config_users(cfg: &mut web::ServiceConfig) {
    cfg.route("/register", web::get().to(show_register_form))
        .route("/register", web::post().to(handle_register))
        .route("/user_maintenance", web::get().to(show_user_maintenance))
        .route("/{user_id}/account", web::get().to(show_account_form))
        .route("/{user_id}/account", web::post().to(handle_account_update))
        .route("/{user_id}/delete", web::get().to(handle_delete))
        .route("/{user_id}/delete", web::post().to(handle_delete));
}

fn set_notification(session: &Session, message: &str, r#type: &str) {
    let notification = Notification { message: message.to_string(), r#type: r#type.to_string() };
    if let Err(e) = session.insert("notification", &notification) {
        log::error!("Failed to store notification in session: {}", e);
    }
}

fn redirect_to_listing() -> HttpResponse {
    HttpResponse::Found().append_header(("location", LISTING_URL)).finish()
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().content_type("text/plain; charset=utf-8").body("User not found")
}

fn render(tera: &Tera, template: &str, ctx: &Context) -> HttpResponse {
    match tera.render(template, ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error in '{}': {}", template, err);
            HttpResponse::InternalServerError().body("Error rendering page.")
        }
    }
}

fn internal_error(action: &str, e: &UserHelperError) -> HttpResponse {
    log::error!("Failed to {}: {}", action, e);
    HttpResponse::InternalServerError().body("An internal error occurred.")
}

fn register_context(form: &RegistrationForm, errors: &FormErrors) -> Context {
    let mut ctx = Context::new();
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx
}

// `page` falls back to 1 when absent or not an integer. Integers too large
// for `i64` saturate so they land on the out-of-range 404.
fn requested_page(query: &PageQuery) -> i64 {
    let Some(raw) = query.page.as_deref().map(str::trim) else { return 1 };
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 1;
    }
    match raw.parse::<i64>() {
        Ok(page) => page,
        Err(_) if raw.starts_with('-') => i64::MIN,
        Err(_) => i64::MAX,
    }
}

async fn show_register_form(tera: web::Data<Tera>) -> impl Responder {
    render(&tera, "register.html", &register_context(&RegistrationForm::default(), &FormErrors::default()))
}

async fn handle_register(
    session: Session,
    pool: web::Data<DbPool>,
    tera: web::Data<Tera>,
    config: web::Data<Config>,
    form: web::Bytes,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response, // Return the 400 Bad Request
    };
    let submission = RegistrationForm::from_fields(&parsed);

    match user_helpers::register_user(&pool, &submission, config.password_hash_cost) {
        Ok(user) => {
            log::info!("Registered user '{}' (id {})", user.username, user.id);
            set_notification(&session, "User registered.", "success");
            redirect_to_listing()
        }
        Err(UserHelperError::Invalid(errors)) => {
            log::warn!("Rejected registration for '{}': {:?}", submission.username, errors);
            render(&tera, "register.html", &register_context(&submission, &errors))
        }
        Err(e) => internal_error("register user", &e),
    }
}

async fn show_user_maintenance(
    session: Session,
    pool: web::Data<DbPool>,
    tera: web::Data<Tera>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let users = match user_helpers::fetch_user_page(&pool, requested_page(&query)) {
        Ok(users) => users,
        Err(UserHelperError::NotFound) => return HttpResponse::NotFound().body("Page not found"),
        Err(e) => return internal_error("fetch user listing", &e),
    };

    let mut ctx = Context::new();
    ctx.insert("users", &users);
    if let Ok(Some(notification)) = session.get::<Notification>("notification") {
        ctx.insert("notification", &notification);
        session.remove("notification");
    }
    render(&tera, "user_maintenance.html", &ctx)
}

async fn show_account_form(
    user_id: web::Path<i64>,
    pool: web::Data<DbPool>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let user_id = user_id.into_inner();
    let (user, posts) = match user_helpers::fetch_account(&pool, user_id) {
        Ok(account) => account,
        Err(UserHelperError::NotFound) => return not_found(),
        Err(e) => return internal_error("load account", &e),
    };

    let form = UpdateUserForm {
        email: user.email.clone(),
        username: user.username.clone(),
        ..UpdateUserForm::default()
    };
    let mut ctx = Context::new();
    ctx.insert("user", &user);
    ctx.insert("posts", &posts);
    ctx.insert("form", &form);
    ctx.insert("errors", &FormErrors::default());
    render(&tera, "account.html", &ctx)
}

async fn handle_account_update(
    user_id: web::Path<i64>,
    session: Session,
    pool: web::Data<DbPool>,
    tera: web::Data<Tera>,
    config: web::Data<Config>,
    form: web::Bytes,
) -> impl Responder {
    let user_id = user_id.into_inner();
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let submission = UpdateUserForm::from_fields(&parsed);

    match user_helpers::update_account(&pool, user_id, &submission, config.password_hash_cost) {
        Ok(user) => {
            log::info!("Updated user '{}' (id {})", user.username, user.id);
            set_notification(&session, "User account updated.", "success");
            redirect_to_listing()
        }
        Err(UserHelperError::Invalid(errors)) => {
            log::warn!("Rejected account update for user_id {}: {:?}", user_id, errors);
            let (user, posts) = match user_helpers::fetch_account(&pool, user_id) {
                Ok(account) => account,
                Err(UserHelperError::NotFound) => return not_found(),
                Err(e) => return internal_error("load account", &e),
            };
            let mut ctx = Context::new();
            ctx.insert("user", &user);
            ctx.insert("posts", &posts);
            ctx.insert("form", &submission);
            ctx.insert("errors", &errors);
            render(&tera, "account.html", &ctx)
        }
        Err(UserHelperError::NotFound) => not_found(),
        Err(e) => internal_error("update account", &e),
    }
}

async fn handle_delete(
    user_id: web::Path<i64>,
    session: Session,
    pool: web::Data<DbPool>,
) -> impl Responder {
    let user_id = user_id.into_inner();
    match user_helpers::delete_account(&pool, user_id) {
        Ok(user) => {
            log::info!("Deleted user '{}' (id {})", user.username, user.id);
            set_notification(&session, "User account deleted.", "success");
            redirect_to_listing()
        }
        Err(UserHelperError::NotFound) => not_found(),
        Err(e) => internal_error("delete user", &e),
    }
}
