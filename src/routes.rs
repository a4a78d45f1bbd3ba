use actix_web::{
    get, post,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::{Deserialize, Serialize};
use tera::Context;

use crate::{
    db,
    errors::AppError,
    menu::{self, MenuFilter, CATEGORIES},
    settings::{self, ProfileEditor},
    structs::NotificationPreferences,
    validation::OnboardingForm,
    AppState, TEMPLATES,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index_handler)
        .service(register_form_handler)
        .service(menu_handler)
        .service(dish_handler)
        .service(profile_handler)
        .service(profile_form_handler)
        .service(discard_handler)
        .service(logout_handler);
}

fn render(template: &str, context: &Context) -> Result<String, AppError> {
    TEMPLATES.render(template, context).map_err(|e| {
        log::error!("Failed to render template {}: {}", template, e);
        AppError::TemplateError(e)
    })
}

fn html(mut builder: actix_web::HttpResponseBuilder, body: String) -> HttpResponse {
    builder.content_type("text/html; charset=utf-8").body(body)
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", location))
        .finish()
}

fn onboarding_page(form: &OnboardingForm) -> Result<String, AppError> {
    let mut context = Context::new();
    context.insert("title", "Welcome");
    context.insert("form", form);
    context.insert("can_register", &form.is_form_valid());
    render("onboarding.html", &context)
}

/// Onboarding, prefilled from whatever is stored.
#[get("/")]
pub async fn index_handler(state: Data<AppState>) -> Result<impl Responder, AppError> {
    if settings::is_logged_in(&state.db_pool).await? {
        return Ok(redirect("/menu"));
    }

    let profile = settings::load_profile(&state.db_pool).await?;
    let rendered = onboarding_page(&OnboardingForm::from_profile(&profile))?;
    Ok(html(HttpResponse::Ok(), rendered))
}

#[post("/register")]
pub async fn register_form_handler(
    web::Form(mut form): web::Form<OnboardingForm>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    log::debug!(
        "Register submitted: first_name={}, last_name={}, email={}, phone={}",
        form.first_name,
        form.last_name,
        form.email,
        form.phone_number
    );

    if settings::register(&state.db_pool, &mut form).await? {
        return Ok(redirect("/menu"));
    }

    let rendered = onboarding_page(&form)?;
    Ok(html(HttpResponse::BadRequest(), rendered))
}

#[derive(Serialize)]
struct CategoryChip {
    name: &'static str,
    selected: bool,
    // category to request when the chip is clicked; empty clears the filter
    target: String,
}

#[get("/menu")]
pub async fn menu_handler(
    web::Query(filter): web::Query<MenuFilter>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if !settings::is_logged_in(&state.db_pool).await? {
        return Ok(redirect("/"));
    }

    menu::refresh_menu(&state.http_client, &state.db_pool, &state.menu_url).await;

    let dishes = filter.apply(db::get_all_dishes(&state.db_pool).await?);
    let chips: Vec<CategoryChip> = CATEGORIES
        .iter()
        .map(|&name| CategoryChip {
            name,
            selected: filter
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(name)),
            target: filter.toggle_category(name).unwrap_or_default(),
        })
        .collect();

    let mut context = Context::new();
    context.insert("title", "Menu");
    context.insert("dishes", &dishes);
    context.insert("categories", &chips);
    context.insert("vegan", &filter.vegan);
    context.insert("search", &filter.search.clone().unwrap_or_default());
    context.insert("last_sync", &settings::last_menu_sync(&state.db_pool).await?);

    Ok(html(HttpResponse::Ok(), render("menu.html", &context)?))
}

#[get("/menu/{id}")]
pub async fn dish_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if !settings::is_logged_in(&state.db_pool).await? {
        return Ok(redirect("/"));
    }

    let id = path.into_inner();
    let dish = db::get_dish_by_id(&state.db_pool, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut context = Context::new();
    context.insert("title", &dish.title);
    context.insert("dish", &dish);

    Ok(html(HttpResponse::Ok(), render("dish.html", &context)?))
}

fn profile_page(editor: &ProfileEditor) -> Result<String, AppError> {
    let mut context = Context::new();
    context.insert("title", "Personal information");
    context.insert("form", &editor.form);
    context.insert("notifications", &editor.notifications);
    context.insert("can_save", &editor.form.is_form_valid());
    render("profile.html", &context)
}

#[get("/profile")]
pub async fn profile_handler(state: Data<AppState>) -> Result<impl Responder, AppError> {
    if !settings::is_logged_in(&state.db_pool).await? {
        return Ok(redirect("/"));
    }

    let editor = ProfileEditor::load(&state.db_pool).await?;
    Ok(html(HttpResponse::Ok(), profile_page(&editor)?))
}

/// Posted profile screen. Unchecked checkboxes are absent from the body.
#[derive(Deserialize, Debug)]
pub struct ProfileForm {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone_number: String,
    #[serde(default)]
    order_statuses: bool,
    #[serde(default)]
    password_changes: bool,
    #[serde(default)]
    special_offers: bool,
    #[serde(default)]
    newsletter: bool,
}

impl From<ProfileForm> for ProfileEditor {
    fn from(posted: ProfileForm) -> Self {
        ProfileEditor {
            form: OnboardingForm {
                first_name: posted.first_name,
                last_name: posted.last_name,
                email: posted.email,
                phone_number: posted.phone_number,
                ..OnboardingForm::default()
            },
            notifications: NotificationPreferences {
                order_statuses: posted.order_statuses,
                password_changes: posted.password_changes,
                special_offers: posted.special_offers,
                newsletter: posted.newsletter,
            },
        }
    }
}

#[post("/profile")]
pub async fn profile_form_handler(
    web::Form(posted): web::Form<ProfileForm>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if !settings::is_logged_in(&state.db_pool).await? {
        return Ok(redirect("/"));
    }

    let mut editor = ProfileEditor::from(posted);

    if editor.save(&state.db_pool).await? {
        return Ok(redirect("/menu"));
    }

    Ok(html(HttpResponse::BadRequest(), profile_page(&editor)?))
}

#[post("/profile/discard")]
pub async fn discard_handler(
    web::Form(posted): web::Form<ProfileForm>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if !settings::is_logged_in(&state.db_pool).await? {
        return Ok(redirect("/"));
    }

    let mut editor = ProfileEditor::from(posted);
    editor.discard(&state.db_pool).await?;
    log::info!("Profile edits discarded");
    Ok(html(HttpResponse::Ok(), profile_page(&editor)?))
}

#[post("/logout")]
pub async fn logout_handler(state: Data<AppState>) -> Result<impl Responder, AppError> {
    settings::logout(&state.db_pool).await?;
    Ok(redirect("/"))
}
